//! Generate a soft mask and guide image for one original/proposed pair.
//!
//! Usage:
//! ```sh
//! cargo run --example generate_mask -- original.jpg proposed.jpg out_dir
//! ```

use std::env;
use std::path::Path;
use std::process;

use auto_edit_mask::MaskEngine;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <original> <proposed> [output_dir]", args[0]);
        process::exit(1);
    }

    let engine = MaskEngine::default();
    let output_dir = args.get(3).map(Path::new);
    let result = engine.process_files(args[1].as_ref(), args[2].as_ref(), output_dir);

    if !result.success {
        eprintln!("Error: {}", result.message);
        process::exit(1);
    }
    println!("Done: {}", result.message);
}
