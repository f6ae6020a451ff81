use calcsweep_rs::service::{EvaluationRequest, Mode, Service};

fn main() {
    pretty_env_logger::init();

    let mut service = Service::default();

    for transcript in [
        "five plus three",
        "x squared plus one",
        "two times pi",
        "twelve divided by four",
    ] {
        let mut request = EvaluationRequest::new(transcript, Mode::Scalar).with_variable("x", 2.0);
        request.spoken = true;
        let response = service.handle(&request);
        match serde_json::to_string(&response) {
            Ok(json) => println!("{:<24} -> {}", transcript, json),
            Err(err) => println!("{:<24} -> error: {}", transcript, err),
        }
    }
}
