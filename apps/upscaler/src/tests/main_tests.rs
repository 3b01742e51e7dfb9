use super::*;

#[test]
fn log_filter_defaults_to_info() {
    assert_eq!(log_filter(None).to_string(), "info");
}

#[test]
fn log_filter_honours_rust_log_directives() {
    assert_eq!(
        log_filter(Some("client_core=debug".into())).to_string(),
        "client_core=debug"
    );
}

#[test]
fn invalid_directives_fall_back_to_info() {
    assert_eq!(log_filter(Some("client_core=notalevel".into())).to_string(), "info");
}
