use clap::Parser;

use seqview::sequence::Sequence;

mod app;
mod args;

use app::App;
use args::Args;

fn main() {
    // clion needs help in trait annotation
    let args = <Args as Parser>::parse();

    let sequence = match Sequence::open(&args.root) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Could not open sequence: {e}");
            std::process::exit(-1);
        }
    };

    if args.start >= sequence.len() {
        eprintln!(
            "Nothing to show in {:?}: {} frames, start index {}",
            sequence.root(),
            sequence.len(),
            args.start
        );
        return;
    }

    let first = match sequence.load_frame(args.start) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Could not load frame {}: {e}", args.start);
            std::process::exit(-1);
        }
    };

    let app = match App::new(&first) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Could not set up display: {e}");
            std::process::exit(-1);
        }
    };

    let next = first.index + 1;

    app.run(sequence, next);
}
