//! Basic example - render a small tree to completion and print it

use fiber::{Description, OutputSerializer, Props, TreeMaterializer};
use runtime::RenderSession;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let description = Description::element(
        "article",
        Props::new().with("id", "greeting"),
        vec![
            Description::element("h1", Props::new(), vec!["Hello".into()]),
            Description::element(
                "p",
                Props::new().with("lang", "en"),
                vec!["Rendered one fiber at a time.".into()],
            ),
        ],
    );

    let mut session = RenderSession::new(TreeMaterializer::new());
    let container = session.materializer_mut().container();

    let pass = session.render(description, container);
    println!("Scheduled pass: {}", pass);

    session.run_to_idle()?;

    let output = OutputSerializer::new().serialize(session.materializer(), container)?;
    println!("{}", output);

    Ok(())
}
