use calcsweep_rs::ast::Evaluator;

fn main() {
    pretty_env_logger::init();

    let mut evaluator = Evaluator::new(100);

    let expression = "sin(sqrt(x^2 + y^2))";
    let samples = evaluator
        .sample_surface(expression, (-5.0, 5.0), (-5.0, 5.0), 40)
        .expect("Failed to sample");

    let (rows, columns) = samples.shape();
    println!("z = {} on a {}x{} grid", expression, rows, columns);

    // Coarse preview: every tenth row and column.
    for row in samples.rows().step_by(10) {
        let line: Vec<String> = row
            .iter()
            .step_by(10)
            .map(|value| match value {
                Ok(z) => format!("{:>7.3}", z),
                Err(_) => format!("{:>7}", "-"),
            })
            .collect();
        println!("{}", line.join(" "));
    }
}
