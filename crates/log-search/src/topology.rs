//! 토폴로지 해석 -- 환경 → 머신 → 클러스터 → 서버
//!
//! [`TopologyResolver`]는 불변 설정을 읽어 검색 요청을 구체적인 [`Target`] 목록으로
//! 전개합니다. 모든 목록은 설정에 적힌 순서를 그대로 따르며 정렬하지 않습니다.
//! 알 수 없는 이름은 I/O 시작 전에 설정 에러로 거부됩니다.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use logscope_core::config::{LogTypeConfig, LogscopeConfig, MachineConfig};
use logscope_core::types::{SearchRequest, ServerSelector, Target};
use serde::{Serialize, Serializer};

use crate::error::LogSearchError;

/// 머신 조회 기준
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupKind {
    /// 클러스터 이름으로 조회 -- 해당 클러스터를 가진 모든 머신
    Cluster,
    /// 서버 이름으로 조회 -- 해당 서버를 가진 첫 번째 머신
    Server,
}

/// 선택 가능한 검색 대상 항목 (`env:machine:cluster:server`)
///
/// `machine`이 `None`이면 클러스터 전체(`env:all:cluster:all`)를 뜻합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOption {
    /// 환경 이름
    pub environment: String,
    /// 머신 이름 (None = all)
    pub machine: Option<String>,
    /// 클러스터 이름
    pub cluster: String,
    /// 서버 선택자
    pub server: ServerSelector,
}

impl fmt::Display for TargetOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.environment,
            self.machine.as_deref().unwrap_or("all"),
            self.cluster,
            self.server
        )
    }
}

impl Serialize for TargetOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 토폴로지 해석기
///
/// 설정은 `Arc`로 공유되며 해석기는 이를 읽기만 합니다.
#[derive(Debug, Clone)]
pub struct TopologyResolver {
    config: Arc<LogscopeConfig>,
}

impl TopologyResolver {
    /// 설정으로 해석기를 생성합니다.
    pub fn new(config: Arc<LogscopeConfig>) -> Self {
        Self { config }
    }

    /// 공유 설정을 반환합니다.
    pub fn config(&self) -> &LogscopeConfig {
        &self.config
    }

    /// 환경 안에서 조건에 맞는 머신을 설정 순서대로 반환합니다.
    ///
    /// # Errors
    /// - 환경이 없으면 [`LogSearchError::UnknownEnvironment`]
    /// - 조건에 맞는 머신이 없으면 [`LogSearchError::UnknownCluster`] /
    ///   [`LogSearchError::UnknownServer`]
    pub fn resolve_machines(
        &self,
        environment: &str,
        kind: LookupKind,
        identifier: &str,
    ) -> Result<Vec<&MachineConfig>, LogSearchError> {
        let env = self
            .config
            .environment(environment)
            .ok_or_else(|| LogSearchError::UnknownEnvironment(environment.to_owned()))?;

        let mut machines: Vec<&MachineConfig> = env
            .machines
            .iter()
            .filter_map(|name| self.config.machine(name))
            .filter(|machine| match kind {
                LookupKind::Cluster => machine.cluster(identifier).is_some(),
                LookupKind::Server => machine
                    .clusters
                    .iter()
                    .any(|c| c.servers.iter().any(|s| s == identifier)),
            })
            .collect();
        // 서버 조회는 설정 순서상 첫 머신 하나만
        if kind == LookupKind::Server {
            machines.truncate(1);
        }

        if machines.is_empty() {
            return Err(match kind {
                LookupKind::Cluster => LogSearchError::UnknownCluster {
                    environment: environment.to_owned(),
                    cluster: identifier.to_owned(),
                },
                LookupKind::Server => LogSearchError::UnknownServer {
                    environment: environment.to_owned(),
                    server: identifier.to_owned(),
                },
            });
        }

        Ok(machines)
    }

    /// 이름으로 로그 유형을 찾습니다.
    pub fn resolve_log_type(&self, name: &str) -> Result<&LogTypeConfig, LogSearchError> {
        self.config
            .log_type(name)
            .ok_or_else(|| LogSearchError::UnknownLogType(name.to_owned()))
    }

    /// 검색 요청을 대상 목록으로 전개합니다.
    ///
    /// `all` 서버는 요청한 클러스터를 가진 모든 머신의 모든 서버로 전개됩니다.
    /// 순서는 환경의 머신 순서, 그 안에서 설정된 서버 순서입니다.
    /// 이름을 지정한 서버는 요청한 클러스터에 그 서버를 가진 첫 머신 하나로만
    /// 해석됩니다.
    pub fn resolve_targets(&self, request: &SearchRequest) -> Result<Vec<Target>, LogSearchError> {
        let log_type = self.resolve_log_type(&request.log_type)?;
        let machines =
            self.resolve_machines(&request.environment, LookupKind::Cluster, &request.cluster)?;

        let mut targets = Vec::new();
        match &request.server {
            ServerSelector::All => {
                for machine in machines {
                    let Some(cluster) = machine.cluster(&request.cluster) else {
                        continue;
                    };
                    for server in &cluster.servers {
                        targets.push(self.target(request, log_type, &machine.name, server));
                    }
                }
            }
            ServerSelector::Named(server) => {
                // 서버가 환경에 아예 없으면 여기서 거부된다
                self.resolve_machines(&request.environment, LookupKind::Server, server)?;
                let host = machines
                    .into_iter()
                    .find(|machine| {
                        machine
                            .cluster(&request.cluster)
                            .is_some_and(|c| c.servers.iter().any(|s| s == server))
                    })
                    .ok_or_else(|| LogSearchError::UnknownServer {
                        environment: request.environment.clone(),
                        server: server.clone(),
                    })?;
                targets.push(self.target(request, log_type, &host.name, server));
            }
        }

        Ok(targets)
    }

    /// 로그 파일 절대 경로를 만듭니다.
    ///
    /// 디렉토리 템플릿의 `$cluster`, `$server`와 파일 이름의 `$server`를 치환합니다.
    pub fn log_path(&self, cluster: &str, server: &str, file_name: &str) -> PathBuf {
        let dir = self
            .config
            .log_files
            .path_template
            .replace("$cluster", cluster)
            .replace("$server", server);
        PathBuf::from(dir).join(file_name.replace("$server", server))
    }

    /// 선택 가능한 대상 항목 목록을 반환합니다.
    ///
    /// 각 (환경, 클러스터) 그룹마다 `env:all:cluster:all` 항목이 먼저 오고,
    /// 그 뒤에 그룹에 속한 개별 서버 항목이 설정 순서대로 이어집니다.
    pub fn target_options(&self) -> Vec<TargetOption> {
        let mut options = Vec::new();

        for env in &self.config.environments {
            let mut groups: Vec<(&str, Vec<TargetOption>)> = Vec::new();

            for machine in env.machines.iter().filter_map(|m| self.config.machine(m)) {
                for cluster in &machine.clusters {
                    let index = match groups.iter().position(|(name, _)| *name == cluster.name) {
                        Some(index) => index,
                        None => {
                            groups.push((cluster.name.as_str(), Vec::new()));
                            groups.len() - 1
                        }
                    };
                    for server in &cluster.servers {
                        let option = TargetOption {
                            environment: env.name.clone(),
                            machine: Some(machine.name.clone()),
                            cluster: cluster.name.clone(),
                            server: ServerSelector::Named(server.clone()),
                        };
                        if !groups[index].1.contains(&option) {
                            groups[index].1.push(option);
                        }
                    }
                }
            }

            for (cluster, members) in groups {
                options.push(TargetOption {
                    environment: env.name.clone(),
                    machine: None,
                    cluster: cluster.to_owned(),
                    server: ServerSelector::All,
                });
                options.extend(members);
            }
        }

        options
    }

    fn target(
        &self,
        request: &SearchRequest,
        log_type: &LogTypeConfig,
        machine: &str,
        server: &str,
    ) -> Target {
        Target {
            environment: request.environment.clone(),
            machine: machine.to_owned(),
            cluster: request.cluster.clone(),
            server: server.to_owned(),
            path: self.log_path(&request.cluster, server, &log_type.file_name),
        }
    }
}
