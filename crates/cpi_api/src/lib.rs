//! Typed request/response DTOs for the cross-project impact engine.
//!
//! This crate defines the stable contract shared by the CLI, the IPC
//! transport, and the orchestrator core: task/report entities, the symbol
//! index shape, error types, and the request/response envelope.

pub mod bounds;
pub mod entities;
pub mod error;
pub mod event;
pub mod paging;
pub mod request;
pub mod response;
pub mod symbol;
pub mod version;

pub use bounds::{ContextLines, Cursor, GitOpTimeoutSeconds, MaxImpacts, PageSize};
pub use entities::{AnalysisReport, AnalysisTask, Impact, ImpactType, ProjectRelation, RiskLevel, TaskStatus};
pub use error::{Error, ErrorCode};
pub use event::Event;
pub use paging::{Paging, StreamingChunk};
pub use request::Request;
pub use response::Response;
pub use symbol::{ApiEntry, FileMeta, HttpVerb, InjectionKind, RemoteKind, RpcEntry, SymbolIndex};
pub use version::ApiVersion;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic_serialization() {
        let request1 = Request {
            version: ApiVersion::V0,
            id: "test-123".to_string(),
            payload: request::RequestPayload::GetTask(request::GetTaskRequest {
                task_id: "task-1".to_string(),
            }),
        };
        let request2 = request1.clone();

        let json1 = serde_json::to_string(&request1).unwrap();
        let json2 = serde_json::to_string(&request2).unwrap();
        assert_eq!(json1, json2, "serialization should be deterministic");

        let deserialized: Request = serde_json::from_str(&json1).unwrap();
        assert_eq!(deserialized.version, request1.version);
        assert_eq!(deserialized.id, request1.id);
    }

    #[test]
    fn test_page_size_bounds() {
        assert!(PageSize::try_from(1).is_ok());
        assert!(PageSize::try_from(1000).is_ok());
        assert!(PageSize::try_from(1001).is_err());
        assert!(PageSize::try_from(0).is_err());
    }

    #[test]
    fn test_context_lines_default_and_bounds() {
        assert_eq!(ContextLines::default().get(), 2);
        assert!(ContextLines::try_from(50).is_ok());
        assert!(ContextLines::try_from(51).is_err());
    }

    #[test]
    fn test_cursor() {
        let cursor = Cursor::initial();
        assert_eq!(cursor.get(), "");
        let cursor = Cursor::from("test".to_string());
        assert_eq!(cursor.get(), "test");
    }

    #[test]
    fn test_impact_well_formed() {
        let class_ref = Impact {
            project: "ucenter-provider".to_string(),
            impact_type: ImpactType::ClassReference,
            file: "PointManager.java".to_string(),
            line: 42,
            snippet: "private PointClient pointClient;".to_string(),
            detail: "field injection".to_string(),
            api: None,
        };
        assert!(class_ref.is_well_formed());

        let api_missing = Impact {
            impact_type: ImpactType::ApiCall,
            api: None,
            ..class_ref.clone()
        };
        assert!(!api_missing.is_well_formed());

        let zero_line = Impact { line: 0, ..class_ref };
        assert!(!zero_line.is_well_formed());
    }

    #[test]
    fn test_symbol_index_simple_name_lookup() {
        let mut idx = SymbolIndex::new("abc123");
        idx.insert_class("com.example.service.UserService", "UserService.java");
        assert_eq!(
            idx.class_map.get("com.example.service.UserService").unwrap(),
            "UserService.java"
        );
        assert!(idx.simple_name_index.get("UserService").unwrap().contains("com.example.service.UserService"));
    }
}
