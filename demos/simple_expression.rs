use calcsweep_rs::ast::{Environment, Evaluator};
use log::debug;

fn main() {
    pretty_env_logger::init();

    let mut evaluator = Evaluator::new(100);
    let environment = Environment::new().with("x", 3.0);

    let expressions = [
        "2+3*4",
        "2^3^2",
        "-2^2",
        "2x",
        "1/2x",
        "sqrt(-1)",
        "x+y",
        "sin(",
    ];

    for expression in expressions {
        match evaluator.evaluate_expression(expression, &environment) {
            Ok(result) => println!("{:>10} = {}", expression, result),
            Err(err) => println!("{:>10} : error: {}", expression, err),
        }
    }
    debug!("cached expressions: {}", evaluator.cache_len());
}
