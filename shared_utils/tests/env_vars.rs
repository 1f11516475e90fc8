use serial_test::serial;
use shared_utils::{ConfigError, env_or, get_env_var};

#[test]
#[serial]
fn missing_variable_is_reported_by_name() {
    unsafe { std::env::remove_var("SHARED_UTILS_TEST_MISSING") };

    let err = get_env_var("SHARED_UTILS_TEST_MISSING").unwrap_err();
    assert!(matches!(err, ConfigError::MissingEnvVar(ref n) if n == "SHARED_UTILS_TEST_MISSING"));
}

#[test]
#[serial]
fn env_or_parses_and_falls_back() {
    unsafe { std::env::remove_var("SHARED_UTILS_TEST_SECS") };
    assert_eq!(env_or("SHARED_UTILS_TEST_SECS", 30u64).unwrap(), 30);

    unsafe { std::env::set_var("SHARED_UTILS_TEST_SECS", " 45 ") };
    assert_eq!(env_or("SHARED_UTILS_TEST_SECS", 30u64).unwrap(), 45);

    unsafe { std::env::set_var("SHARED_UTILS_TEST_SECS", "soon") };
    let err = env_or("SHARED_UTILS_TEST_SECS", 30u64).unwrap_err();
    assert!(err.to_string().contains("SHARED_UTILS_TEST_SECS"));

    unsafe { std::env::remove_var("SHARED_UTILS_TEST_SECS") };
}
