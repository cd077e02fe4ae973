use kbucketh::{diagnostics, AddOutcome, BucketChain, Identifier};
use std::env;

fn main() {
    pretty_env_logger::init();

    let local: Identifier = match env::args().nth(1) {
        Some(text) => match text.parse() {
            Ok(id) => id,
            Err(error) => {
                eprintln!("{}", error);
                return;
            }
        },
        None => rand::random(),
    };
    let count: usize = env::args()
        .nth(2)
        .and_then(|count| count.parse().ok())
        .unwrap_or(500);

    println!("local id {}", local);

    let mut chain = BucketChain::new(local);
    let mut waitlisted = 0;

    for _ in 0..count {
        if chain.add(rand::random(), ()) == AddOutcome::AddedToWaitlist {
            waitlisted += 1;
        }
    }

    diagnostics::log_layout(&chain);

    let stats = chain.stats();
    println!(
        "{} buckets, {} peers, {} waitlisted ({} on insert)",
        stats.bucket_count, stats.peer_count, stats.waitlisted_count, waitlisted
    );
    println!("{}", diagnostics::summary(&chain));

    for id in chain.nearest(local, 5) {
        println!("{} at bit distance {}", id, local.bit_distance(id));
    }
}
