//! Lightweight Java static analysis: a symbol indexer and usage tracer.
//! No grammar, no type resolution — line-oriented heuristics
//! over Spring/Dubbo/Feign annotation idioms, the same trade-off a
//! framework-annotation scanner makes rather than a full compiler front end.

pub mod index;
pub mod lexer;
pub mod parse;
pub mod usage;

pub use index::{build_index, collect_java_files, IndexBuildResult};
pub use parse::{parse_file, MethodSpan, ParsedFile};
pub use usage::{find_api_callers, find_usages, ApiCall, FileReader, FsFileReader, Usage, UsageKind};
