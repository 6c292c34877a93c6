use sentinel_agent::HttpLlmClient;
use sentinel_core::config::{AppConfig, LoadOptions};
use sentinel_db::{connect_with_config, ping};
use serde::Serialize;

const CONFIG_CHECK: &str = "config_validation";
const LLM_CHECK: &str = "llm_readiness";
const DATABASE_CHECK: &str = "database_connectivity";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

impl CheckStatus {
    fn marker(self) -> &'static str {
        match self {
            Self::Pass => "ok",
            Self::Fail => "fail",
            Self::Skipped => "skip",
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

impl DoctorCheck {
    fn pass(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Pass, details: details.into() }
    }

    fn fail(name: &'static str, details: impl Into<String>) -> Self {
        Self { name, status: CheckStatus::Fail, details: details.into() }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: CheckStatus::Skipped,
            details: "skipped because configuration did not load".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: &'static str,
    checks: Vec<DoctorCheck>,
}

impl DoctorReport {
    fn from_checks(checks: Vec<DoctorCheck>) -> Self {
        let healthy = checks.iter().all(|check| check.status == CheckStatus::Pass);
        Self {
            overall_status: if healthy { CheckStatus::Pass } else { CheckStatus::Fail },
            summary: if healthy {
                "doctor: all readiness checks passed"
            } else {
                "doctor: one or more readiness checks failed"
            },
            checks,
        }
    }

    fn render_human(&self) -> String {
        std::iter::once(self.summary.to_string())
            .chain(self.checks.iter().map(|check| {
                format!("- [{}] {}: {}", check.status.marker(), check.name, check.details)
            }))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn run(json_output: bool) -> String {
    let report = DoctorReport::from_checks(run_checks());

    if !json_output {
        return report.render_human();
    }

    serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
        serde_json::json!({
            "overall_status": "fail",
            "summary": "doctor serialization failed",
            "error": error.to_string(),
        })
        .to_string()
    })
}

fn run_checks() -> Vec<DoctorCheck> {
    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => vec![
            DoctorCheck::pass(CONFIG_CHECK, "configuration loaded and validated"),
            check_llm_readiness(&config),
            check_database_connectivity(&config),
        ],
        Err(error) => vec![
            DoctorCheck::fail(CONFIG_CHECK, error.to_string()),
            DoctorCheck::skipped(LLM_CHECK),
            DoctorCheck::skipped(DATABASE_CHECK),
        ],
    }
}

/// Builds the provider client without sending a request.
fn check_llm_readiness(config: &AppConfig) -> DoctorCheck {
    match HttpLlmClient::from_config(&config.llm) {
        Ok(_) => DoctorCheck::pass(
            LLM_CHECK,
            format!(
                "provider `{}` with model `{}` is configured",
                config.llm.provider, config.llm.model
            ),
        ),
        Err(error) => DoctorCheck::fail(LLM_CHECK, error.to_string()),
    }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck::fail(
                DATABASE_CHECK,
                format!("failed to initialize async runtime: {error}"),
            )
        }
    };

    let connected = runtime.block_on(async {
        let pool = connect_with_config(&config.database).await?;
        ping(&pool).await?;
        pool.close().await;
        Ok::<(), sentinel_db::RepositoryError>(())
    });

    match connected {
        Ok(()) => {
            DoctorCheck::pass(DATABASE_CHECK, format!("connected using `{}`", config.database.url))
        }
        Err(error) => DoctorCheck::fail(DATABASE_CHECK, format!("database unreachable: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{DoctorCheck, DoctorReport, CONFIG_CHECK, DATABASE_CHECK, LLM_CHECK};

    #[test]
    fn any_non_passing_check_fails_the_report() {
        let report = DoctorReport::from_checks(vec![
            DoctorCheck::pass(CONFIG_CHECK, "ok"),
            DoctorCheck::fail(LLM_CHECK, "llm.api_key is required"),
            DoctorCheck::skipped(DATABASE_CHECK),
        ]);

        let human = report.render_human();
        let lines: Vec<&str> = human.lines().collect();
        assert_eq!(lines[0], "doctor: one or more readiness checks failed");
        assert_eq!(lines[1], "- [ok] config_validation: ok");
        assert_eq!(lines[2], "- [fail] llm_readiness: llm.api_key is required");
        assert!(lines[3].starts_with("- [skip] database_connectivity"));
    }
}
