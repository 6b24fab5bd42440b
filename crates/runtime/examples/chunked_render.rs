//! Chunked example - drive the scheduler with tiny time slices and watch
//! the pass yield, resume, and commit through lifecycle events

use std::time::Duration;

use fiber::{Description, OutputSerializer, Props, TreeMaterializer};
use runtime::{RenderEvent, RenderSession, TickStatus, TimeSlice};

fn wide_tree(rows: i64) -> Description {
    let children = (0..rows)
        .map(|n| {
            Description::element(
                "row",
                Props::new().with("n", n),
                vec![format!("row {}", n).into()],
            )
        })
        .collect();
    Description::element("list", Props::new(), children)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut session = RenderSession::new(TreeMaterializer::new());
    let container = session.materializer_mut().container();
    let events = session.subscribe();

    session.render(wide_tree(200), container);

    // Stand-in for a host idle loop: a fresh, very small slice per turn
    let mut turns = 0;
    while session.tick(&TimeSlice::new(Duration::from_micros(50)))? == TickStatus::Pending {
        turns += 1;
    }
    println!("Drained in {} turns", turns + 1);

    for event in events.try_iter() {
        match event {
            RenderEvent::PassYielded { units_done, .. } => {
                println!("  yielded after {} units", units_done)
            }
            RenderEvent::PassCommitted { fiber_count, .. } => {
                println!("  committed {} fibers", fiber_count)
            }
            _ => {}
        }
    }

    let output = OutputSerializer::new().serialize(session.materializer(), container)?;
    println!("{} chars of output", output.len());

    Ok(())
}
