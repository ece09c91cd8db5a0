//! Given a main repo and a set of already
//! materialized related repos, finds every cross-project reference to a
//! changed symbol. A per-repo index is fetched from [`cpi_index::IndexCache`]
//! or rebuilt via [`cpi_java::build_index`]; a repo whose index can't be
//! resolved is marked `DEGRADED` and excluded from the scan rather than
//! failing the whole trace.

use cpi_api::{Error, ErrorCode, Impact, ImpactType, InjectionKind, SymbolIndex};
use cpi_git::GitBackend;
use cpi_index::IndexCache;
use cpi_java::{FsFileReader, UsageKind};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Fetches `root`'s index from `cache` if HEAD matches, else builds it fresh
/// via [`cpi_java::build_index`] and writes it through. Shared by the
/// tracer's per-related-repo slots and the orchestrator's main-repo index,
/// which propagates this `Err` as fatal (GitOpError on the main repo).
pub async fn build_or_fetch_index(
    git: &dyn GitBackend,
    cache: &mut IndexCache,
    root: &Path,
    timeout: Duration,
) -> Result<SymbolIndex, Error> {
    let commit = git.rev_parse(root, "HEAD", timeout).await?;

    match cache.get(root, &commit) {
        Ok(Some(index)) => return Ok(index),
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "index cache read failed, rebuilding fresh"),
    }

    let result = cpi_java::build_index(root, &commit)
        .map_err(|e| Error::new(ErrorCode::ParseError, format!("failed to walk repo: {e}")))?;
    for (path, err) in &result.file_errors {
        tracing::warn!(file = %path, error = %err, "java file skipped during indexing");
    }
    if let Err(e) = cache.put(root, &result.index) {
        tracing::warn!(error = %e, "index cache write failed, continuing uncached");
    }
    Ok(result.index)
}

/// Maps one [`cpi_java::Usage`] to a typed [`Impact`] under `project`: plain
/// type-token references and Spring-DI injections are `class_reference`,
/// Dubbo injections are `rpc_reference` — a Dubbo field
/// line is reported only once, not double-booked as both.
pub fn impact_from_usage(project: &str, usage: cpi_java::Usage) -> Impact {
    let (impact_type, detail) = match usage.kind {
        UsageKind::TypeReference => (ImpactType::ClassReference, "type reference".to_string()),
        UsageKind::Injection(InjectionKind::SpringDi) => {
            (ImpactType::ClassReference, "spring_di injection".to_string())
        }
        UsageKind::Injection(InjectionKind::Dubbo) => {
            (ImpactType::RpcReference, "dubbo injection".to_string())
        }
    };
    Impact {
        project: project.to_string(),
        impact_type,
        file: usage.path,
        line: usage.line,
        snippet: usage.snippet,
        detail,
        api: None,
    }
}

/// Outcome of indexing one related repo.
enum SlotOutcome {
    Ready(SymbolIndex),
    Degraded(String),
}

struct RepoSlot {
    name: String,
    root: PathBuf,
    outcome: SlotOutcome,
}

/// Result of one [`MultiProjectTracer::find_cross_project_impacts`] call.
#[derive(Debug, Default)]
pub struct TraceOutcome {
    pub impacts: Vec<Impact>,
    pub degraded_projects: Vec<String>,
}

/// Traces usages of a changed symbol across every related repo (never the
/// main repo — Property 12 is structural here, since the main root is never
/// added as a slot).
pub struct MultiProjectTracer {
    slots: Vec<RepoSlot>,
}

impl MultiProjectTracer {
    /// Builds the tracer over `related_roots` (name, materialized path
    /// pairs), fetching or building each one's index. Called even when
    /// `related_roots` is empty, in which case every trace trivially
    /// returns `[]`.
    pub async fn init(
        git: &dyn GitBackend,
        cache: &mut IndexCache,
        related_roots: &[(String, PathBuf)],
        timeout: Duration,
    ) -> Self {
        let mut slots = Vec::with_capacity(related_roots.len());
        for (name, root) in related_roots {
            let outcome = Self::load_or_build(git, cache, root, timeout).await;
            if let SlotOutcome::Degraded(reason) = &outcome {
                tracing::warn!(project = %name, reason = %reason, "project index degraded, will be skipped");
            }
            slots.push(RepoSlot {
                name: name.clone(),
                root: root.clone(),
                outcome,
            });
        }
        Self { slots }
    }

    async fn load_or_build(
        git: &dyn GitBackend,
        cache: &mut IndexCache,
        root: &Path,
        timeout: Duration,
    ) -> SlotOutcome {
        match build_or_fetch_index(git, cache, root, timeout).await {
            Ok(index) => SlotOutcome::Ready(index),
            Err(e) => SlotOutcome::Degraded(e.to_string()),
        }
    }

    pub fn degraded_projects(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter_map(|s| match &s.outcome {
                SlotOutcome::Degraded(_) => Some(s.name.clone()),
                SlotOutcome::Ready(_) => None,
            })
            .collect()
    }

    /// `changed_methods` is accepted per the C3 contract but not used to
    /// filter candidate routes: `ApiEntry` carries no method-name field, so
    /// route candidates are every route declared in `fqn`'s own file (see
    /// DESIGN.md for the open-question resolution).
    pub fn find_cross_project_impacts(
        &self,
        main_index: &SymbolIndex,
        fqn: &str,
        _changed_methods: &[String],
    ) -> TraceOutcome {
        let remote_kind = main_index.remote_interfaces.get(fqn);
        let candidate_routes: Vec<String> = match (remote_kind, main_index.class_map.get(fqn)) {
            (Some(_), Some(file)) => main_index
                .api_map
                .values()
                .flatten()
                .filter(|entry| &entry.file == file)
                .map(|entry| entry.route.clone())
                .collect(),
            _ => Vec::new(),
        };

        let mut impacts = Vec::new();
        let mut degraded = Vec::new();

        for slot in &self.slots {
            let index_r = match &slot.outcome {
                SlotOutcome::Ready(idx) => idx,
                SlotOutcome::Degraded(_) => {
                    degraded.push(slot.name.clone());
                    continue;
                }
            };
            let reader = FsFileReader::new(&slot.root);

            for usage in cpi_java::find_usages(index_r, fqn, &reader) {
                impacts.push(impact_from_usage(&slot.name, usage));
            }

            if remote_kind.is_some() {
                for route in &candidate_routes {
                    for call in cpi_java::find_api_callers(index_r, route, &reader) {
                        impacts.push(Impact {
                            project: slot.name.clone(),
                            impact_type: ImpactType::ApiCall,
                            file: call.path,
                            line: call.line,
                            snippet: call.snippet,
                            detail: format!("calls {route}"),
                            api: Some(call.route),
                        });
                    }
                }
            }
        }

        // Sort by (project, file, line) ascending.
        impacts.sort_by(|a, b| {
            (a.project.as_str(), a.file.as_str(), a.line).cmp(&(b.project.as_str(), b.file.as_str(), b.line))
        });

        TraceOutcome {
            impacts,
            degraded_projects: degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpi_api::{ApiEntry, HttpVerb, RemoteKind, RpcEntry};
    use cpi_git::StubGitBackend;
    use std::collections::BTreeMap;

    fn write_file(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn tmp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cpi_tracer_test_{name}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn empty_related_roots_trivially_yields_no_impacts() {
        let tracer = MultiProjectTracer { slots: Vec::new() };
        let main_index = SymbolIndex::new("c1");
        let outcome = tracer.find_cross_project_impacts(&main_index, "com.example.Foo", &[]);
        assert!(outcome.impacts.is_empty());
        assert!(outcome.degraded_projects.is_empty());
    }

    #[test]
    fn spring_di_injection_maps_to_class_reference_dubbo_to_rpc_reference() {
        let related_root = tmp_dir("related");
        write_file(
            &related_root,
            "PointManager.java",
            "package com.example.provider;\n@Resource private PointClient pointClient;\n",
        );

        let mut index_r = SymbolIndex::new("c1");
        index_r.file_meta.insert(
            "PointManager.java".to_string(),
            cpi_api::FileMeta {
                package: "com.example.provider".to_string(),
                imports_explicit: BTreeMap::new(),
                imports_wildcard: Vec::new(),
            },
        );
        index_r.rpc_map.insert(
            "PointClient".to_string(),
            vec![RpcEntry {
                interface: "PointClient".to_string(),
                file: "PointManager.java".to_string(),
                line: 2,
                kind: InjectionKind::SpringDi,
            }],
        );

        let tracer = MultiProjectTracer {
            slots: vec![RepoSlot {
                name: "ucenter-provider".to_string(),
                root: related_root,
                outcome: SlotOutcome::Ready(index_r),
            }],
        };

        let main_index = SymbolIndex::new("c0");
        let outcome =
            tracer.find_cross_project_impacts(&main_index, "com.example.client.PointClient", &[]);
        assert_eq!(outcome.impacts.len(), 1);
        assert_eq!(outcome.impacts[0].impact_type, ImpactType::ClassReference);
        assert_eq!(outcome.impacts[0].project, "ucenter-provider");
    }

    #[test]
    fn degraded_slot_is_skipped_and_reported() {
        let tracer = MultiProjectTracer {
            slots: vec![RepoSlot {
                name: "broken-repo".to_string(),
                root: PathBuf::from("/nonexistent"),
                outcome: SlotOutcome::Degraded("rev-parse failed".to_string()),
            }],
        };
        let main_index = SymbolIndex::new("c0");
        let outcome = tracer.find_cross_project_impacts(&main_index, "com.example.Foo", &[]);
        assert!(outcome.impacts.is_empty());
        assert_eq!(outcome.degraded_projects, vec!["broken-repo".to_string()]);
    }

    #[test]
    fn feign_route_lookup_surfaces_api_call_impacts() {
        let related_root = tmp_dir("related_feign");
        write_file(
            &related_root,
            "Caller.java",
            "package com.example.consumer;\nclass Caller {\n  void call() {\n    restTemplate.getForObject(\"/points/batch\", String.class);\n  }\n}\n",
        );

        let mut index_r = SymbolIndex::new("c1");
        index_r.files_scanned.insert("Caller.java".to_string());
        index_r.file_meta.insert(
            "Caller.java".to_string(),
            cpi_api::FileMeta {
                package: "com.example.consumer".to_string(),
                imports_explicit: BTreeMap::new(),
                imports_wildcard: Vec::new(),
            },
        );

        let tracer = MultiProjectTracer {
            slots: vec![RepoSlot {
                name: "ucenter-provider".to_string(),
                root: related_root,
                outcome: SlotOutcome::Ready(index_r),
            }],
        };

        let mut main_index = SymbolIndex::new("c0");
        main_index.insert_class("com.example.client.PointClient", "PointClient.java");
        main_index.remote_interfaces.insert(
            "com.example.client.PointClient".to_string(),
            RemoteKind::Feign {
                client_name: "pay-provider".to_string(),
            },
        );
        main_index.api_map.insert(
            "/points/batch".to_string(),
            vec![ApiEntry {
                route: "/points/batch".to_string(),
                verb: HttpVerb::Post,
                file: "PointClient.java".to_string(),
                line: 5,
            }],
        );

        let outcome =
            tracer.find_cross_project_impacts(&main_index, "com.example.client.PointClient", &[]);
        assert_eq!(outcome.impacts.len(), 1);
        assert_eq!(outcome.impacts[0].impact_type, ImpactType::ApiCall);
        assert_eq!(outcome.impacts[0].api.as_deref(), Some("/points/batch"));
    }

    #[tokio::test]
    async fn init_marks_unreachable_repo_degraded() {
        let mut cache = IndexCache::new(tmp_dir("cache"));
        let related = vec![("broken".to_string(), PathBuf::from("/nonexistent"))];
        let tracer = MultiProjectTracer::init(&StubGitBackend, &mut cache, &related, Duration::from_secs(1)).await;
        assert_eq!(tracer.degraded_projects(), vec!["broken".to_string()]);
    }
}
