//! Hosting platform detection from environment variables.

use serde::Serialize;

/// Detected hosting platform and the signal that identified it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    pub name: &'static str,
    pub evidence: &'static str,
}

struct Signal {
    name: &'static str,
    evidence: &'static str,
    vars: [&'static str; 2],
}

/// Checked in order; the first platform with any variable set wins.
const SIGNALS: [Signal; 4] = [
    Signal {
        name: "cloud_run",
        evidence: "K_SERVICE/CLOUD_RUN_JOB",
        vars: ["K_SERVICE", "CLOUD_RUN_JOB"],
    },
    Signal {
        name: "railway",
        evidence: "RAILWAY_ENVIRONMENT/PROJECT_ID",
        vars: ["RAILWAY_ENVIRONMENT", "RAILWAY_PROJECT_ID"],
    },
    Signal {
        name: "render",
        evidence: "RENDER/RENDER_SERVICE_ID",
        vars: ["RENDER", "RENDER_SERVICE_ID"],
    },
    Signal {
        name: "vercel",
        evidence: "VERCEL/VERCEL_URL",
        vars: ["VERCEL", "VERCEL_URL"],
    },
];

pub const LOCAL: PlatformInfo = PlatformInfo {
    name: "local",
    evidence: "none",
};

/// Detect the platform from the process environment.
pub fn detect() -> PlatformInfo {
    detect_with(|key| std::env::var(key).ok())
}

/// Detect the platform using `lookup` for variable values.
///
/// A variable that is set but empty does not count.
pub fn detect_with<F>(lookup: F) -> PlatformInfo
where
    F: Fn(&str) -> Option<String>,
{
    let is_set = |key: &str| lookup(key).is_some_and(|v| !v.is_empty());

    SIGNALS
        .iter()
        .find(|signal| signal.vars.iter().any(|var| is_set(var)))
        .map(|signal| PlatformInfo {
            name: signal.name,
            evidence: signal.evidence,
        })
        .unwrap_or(LOCAL)
}
