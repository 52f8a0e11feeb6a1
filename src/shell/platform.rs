//! Platform detection.

/// Check if running in a CI environment.
///
/// Used to force non-interactive mode in `main()` so install prompts never
/// block a pipeline. Checks common CI environment variables: `CI`,
/// `GITHUB_ACTIONS`, `GITLAB_CI`, `CIRCLECI`, `TRAVIS`, `JENKINS_URL`.
pub fn is_ci() -> bool {
    is_ci_with(|key| std::env::var(key).is_ok())
}

fn is_ci_with(is_set: impl Fn(&str) -> bool) -> bool {
    [
        "CI",
        "GITHUB_ACTIONS",
        "GITLAB_CI",
        "CIRCLECI",
        "TRAVIS",
        "JENKINS_URL",
    ]
    .iter()
    .any(|key| is_set(key))
}
