use crate::error::Error;

#[test]
fn kind_tags_are_stable_snake_case() {
    let cases = [
        (Error::not_found("capability", "Clock::cycle"), "not_found"),
        (Error::invalid_input("speed must be an integer"), "invalid_input"),
        (
            Error::invocation_failed("SpeedControl::set_speed", "bad argument"),
            "invocation_failed",
        ),
        (Error::reload_failed("truncated artifact"), "reload_failed"),
        (Error::transport_failed("host thread is gone"), "transport_failed"),
    ];
    for (error, tag) in cases {
        assert_eq!(error.kind(), tag, "{error}");
    }
}
