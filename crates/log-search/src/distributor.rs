//! 작업 분배기 -- 검색 진입점
//!
//! [`LogSearch`]는 검색 요청 하나를 다음 순서로 처리합니다.
//!
//! 1. 로그 유형과 태그 규칙을 확인하고 대상 목록을 해석합니다 (I/O 없음).
//! 2. 대상을 배치 크기 `max(1, floor(capacity * utilization))`로 나눕니다.
//! 3. 배치마다 대상별 워커 태스크를 동시에 실행하고, 모두 끝날 때까지 기다린 뒤
//!    다음 배치로 넘어갑니다 (배치 간 동시 실행 없음).
//! 4. 완료된 대상 결과를 [`Aggregator`]로 병합합니다.
//!
//! # 실패 정책
//! - `fail_fast` (기본값): 첫 대상 실패에서 남은 워커를 취소하고 에러를 반환합니다.
//! - `partial`: 실패한 대상을 `SearchResult::failures`에 기록하고 계속 진행합니다.
//!
//! 설정 에러(알 수 없는 이름, 잘못된 태그)는 정책과 무관하게 I/O 전에 반환됩니다.

use std::sync::Arc;
use std::time::Instant;

use logscope_core::config::{FailurePolicy, LogscopeConfig};
use logscope_core::metrics as m;
use logscope_core::types::{SearchRequest, SearchResult, Target};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use crate::aggregate::Aggregator;
use crate::config::SearchConfig;
use crate::error::LogSearchError;
use crate::extract::RecordExtractor;
use crate::filter::KeywordFilter;
use crate::source::{LineSource, RemoteShell, SshShell, detect_local_host};
use crate::topology::TopologyResolver;
use crate::worker::ScanContext;

/// 분산 로그 검색 엔진
///
/// 설정은 생성 시 한 번 주입되며 이후 변경되지 않습니다.
/// 같은 엔진으로 여러 검색을 순서대로 또는 동시에 실행할 수 있습니다.
pub struct LogSearch<S: RemoteShell = SshShell> {
    config: SearchConfig,
    resolver: TopologyResolver,
    source: Arc<LineSource<S>>,
}

impl LogSearch<SshShell> {
    /// 통합 설정으로 ssh 기반 엔진을 생성합니다.
    pub fn from_config(config: Arc<LogscopeConfig>) -> Result<Self, LogSearchError> {
        let search_config = SearchConfig::from_core(&config.search);
        let shell = SshShell::new(
            search_config.remote_shell.clone(),
            search_config.remote_shell_args.clone(),
        );
        Self::new(config, search_config, shell)
    }
}

impl<S: RemoteShell> LogSearch<S> {
    /// 통합 설정, 엔진 설정, 원격 셸로 엔진을 생성합니다.
    ///
    /// # Errors
    /// 엔진 설정이 유효하지 않으면 [`LogSearchError::Config`]
    pub fn new(
        config: Arc<LogscopeConfig>,
        search_config: SearchConfig,
        shell: S,
    ) -> Result<Self, LogSearchError> {
        search_config.validate()?;
        let local_host = detect_local_host(&search_config.local_host);
        debug!(local_host = %local_host, "log search engine created");

        Ok(Self {
            config: search_config,
            resolver: TopologyResolver::new(config),
            source: Arc::new(LineSource::new(local_host, shell)),
        })
    }

    /// 엔진 설정
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// 토폴로지 해석기
    pub fn resolver(&self) -> &TopologyResolver {
        &self.resolver
    }

    /// 로컬 호스트로 취급하는 호스트 이름
    pub fn local_host(&self) -> &str {
        self.source.local_host()
    }

    /// 검색을 실행합니다.
    ///
    /// 결과가 비어 있는 것은 에러가 아니며 [`SearchResult::is_empty`]로 확인합니다.
    ///
    /// # Errors
    /// - 요청이 설정과 맞지 않으면 설정 계열 에러 ([`LogSearchError::is_configuration`])
    /// - `fail_fast` 정책에서 대상 하나라도 I/O에 실패하면 그 에러
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResult, LogSearchError> {
        let search_id = Uuid::new_v4();
        let span = info_span!(
            "search",
            %search_id,
            environment = %request.environment,
            cluster = %request.cluster,
            server = %request.server,
            log_type = %request.log_type
        );

        let started = Instant::now();
        let outcome = self.run(request).instrument(span).await;

        metrics::histogram!(m::SEARCH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        let label = match &outcome {
            Ok(result) if result.is_empty() => "empty",
            Ok(_) => "success",
            Err(_) => "failure",
        };
        metrics::counter!(m::SEARCHES_TOTAL, m::LABEL_RESULT => label).increment(1);

        outcome
    }

    async fn run(&self, request: &SearchRequest) -> Result<SearchResult, LogSearchError> {
        if request.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(LogSearchError::InvalidRequest(
                "at least one non-empty keyword is required".to_owned(),
            ));
        }

        let log_type = self.resolver.resolve_log_type(&request.log_type)?;
        let extractor = RecordExtractor::from_log_type(log_type)?;
        let targets = self.resolver.resolve_targets(request)?;
        let batch_size = self.config.batch_size();

        info!(
            targets = targets.len(),
            batch_size,
            tag = extractor.rule().kind(),
            keywords = request.keywords.len(),
            criteria = %request.criteria,
            "search started"
        );

        let ctx = Arc::new(ScanContext::new(
            Arc::clone(&self.source),
            extractor,
            KeywordFilter::from_request(request),
            request.log_type.clone(),
        ));

        let started = Instant::now();
        let mut aggregator = Aggregator::new();
        for (index, batch) in targets.chunks(batch_size).enumerate() {
            debug!(batch = index, size = batch.len(), "batch started");
            self.run_batch(&ctx, batch, &mut aggregator).await?;
        }

        let result = aggregator.finish(&targets);
        info!(
            matched_targets = result.target_count(),
            records = result.record_count(),
            failed_targets = result.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "search finished"
        );

        Ok(result)
    }

    /// 배치 하나를 실행하고 모든 워커가 끝날 때까지 기다립니다.
    async fn run_batch(
        &self,
        ctx: &Arc<ScanContext<S>>,
        batch: &[Target],
        aggregator: &mut Aggregator,
    ) -> Result<(), LogSearchError> {
        let mut workers = JoinSet::new();
        for target in batch {
            let ctx = Arc::clone(ctx);
            let target = target.clone();
            workers.spawn(
                async move {
                    let outcome = ctx.scan(&target).await;
                    (target, outcome)
                }
                .in_current_span(),
            );
        }

        while let Some(joined) = workers.join_next().await {
            let (target, outcome) =
                joined.map_err(|e| LogSearchError::Worker(format!("worker task failed: {e}")))?;

            match outcome {
                Ok(Some(matches)) => aggregator.insert(matches),
                Ok(None) => {}
                Err(err) => {
                    metrics::counter!(m::TARGETS_FAILED_TOTAL).increment(1);
                    match self.config.failure_policy {
                        FailurePolicy::FailFast => {
                            workers.abort_all();
                            warn!(
                                target_id = %target.id(),
                                error = %err,
                                "target failed, aborting search"
                            );
                            return Err(err);
                        }
                        FailurePolicy::Partial => {
                            warn!(
                                target_id = %target.id(),
                                error = %err,
                                "target failed, continuing"
                            );
                            aggregator.record_failure(target, err.to_string());
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SearchConfigBuilder;
    use crate::source::shell::MockShell;
    use logscope_core::types::Criteria;

    const CONFIG: &str = r#"
[log_files]
path_template = "/logs/$cluster/"

[[environments]]
name = "itg"
machines = ["host-a", "host-b"]

[[machines]]
name = "host-a"
[[machines.clusters]]
name = "cluster1"
servers = ["s1", "s2"]

[[machines]]
name = "host-b"
[[machines.clusters]]
name = "cluster1"
servers = ["s3"]

[[log_types]]
name = "access_log"
file_name = "$server.log"
headers = ["Time", "Level", "Message"]
tag = "|"

[[log_types]]
name = "broken_log"
file_name = "$server.log"
headers = ["Message"]
tag = { kind = "pattern", pattern = "(" }
"#;

    fn engine(shell: MockShell, policy: FailurePolicy, capacity: usize) -> LogSearch<MockShell> {
        let config = Arc::new(LogscopeConfig::parse(CONFIG).unwrap());
        let search_config = SearchConfigBuilder::new()
            .local_host("this-host")
            .capacity(capacity)
            .utilization(1.0)
            .failure_policy(policy)
            .build()
            .unwrap();
        LogSearch::new(config, search_config, shell).unwrap()
    }

    fn shell() -> MockShell {
        MockShell::new()
            .with_file("host-a", "/logs/cluster1/s1.log", "1|ERROR|db error\n")
            .with_file(
                "host-a",
                "/logs/cluster1/s2.log",
                "1|ERROR|error\n2|ERROR|error again\n",
            )
            .with_file("host-b", "/logs/cluster1/s3.log", "1|INFO|fine\n")
    }

    fn request(server: &str, keywords: &[&str], criteria: Criteria) -> SearchRequest {
        SearchRequest::new("itg", "cluster1", server, "access_log", keywords, criteria).unwrap()
    }

    #[tokio::test]
    async fn search_orders_targets_by_counts() {
        let engine = engine(shell(), FailurePolicy::FailFast, 4);
        let result = engine
            .search(&request("all", &["error"], Criteria::Any))
            .await
            .unwrap();

        let servers: Vec<&str> = result
            .tallies
            .iter()
            .map(|(t, _)| t.server.as_str())
            .collect();
        assert_eq!(servers, vec!["s2", "s1"]);
        assert_eq!(result.tallies[0].1.get("error"), Some(4));
        assert_eq!(result.records[0].1.len(), 2);
    }

    #[tokio::test]
    async fn sequential_and_parallel_agree() {
        let parallel = engine(shell(), FailurePolicy::FailFast, 8);
        let sequential = engine(shell(), FailurePolicy::FailFast, 1);
        let req = request("all", &["error"], Criteria::Any);

        let a = parallel.search(&req).await.unwrap();
        let b = sequential.search(&req).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let engine = engine(shell(), FailurePolicy::FailFast, 2);
        let result = engine
            .search(&request("all", &["nothing-matches"], Criteria::All))
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn fail_fast_aborts_on_target_failure() {
        let engine = engine(shell().with_failing("host-b"), FailurePolicy::FailFast, 2);
        let err = engine
            .search(&request("all", &["error"], Criteria::Any))
            .await
            .unwrap_err();
        assert!(matches!(err, LogSearchError::Remote { .. }));
    }

    #[tokio::test]
    async fn partial_policy_reports_failures() {
        let engine = engine(shell().with_failing("host-b"), FailurePolicy::Partial, 2);
        let result = engine
            .search(&request("all", &["error"], Criteria::Any))
            .await
            .unwrap();
        assert_eq!(result.target_count(), 2);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].target.server, "s3");
    }

    #[tokio::test]
    async fn invalid_tag_is_configuration_error() {
        let engine = engine(shell(), FailurePolicy::Partial, 2);
        let req =
            SearchRequest::new("itg", "cluster1", "all", "broken_log", ["x"], Criteria::Any)
                .unwrap();
        let err = engine.search(&req).await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn unknown_environment_fails_before_io() {
        let engine = engine(MockShell::new().with_failing("host-a"), FailurePolicy::Partial, 2);
        let req =
            SearchRequest::new("qa", "cluster1", "all", "access_log", ["x"], Criteria::Any)
                .unwrap();
        let err = engine.search(&req).await.unwrap_err();
        assert!(matches!(err, LogSearchError::UnknownEnvironment(_)));
    }
}
