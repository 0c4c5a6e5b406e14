//! Print the full-context label sequence for a small fixed utterance:
//! two breath groups, the second phrase interrogative.
//!
//! Run with `RUST_LOG=debug` to see the tree-build summary.

use fullcontext_label::{full_context_labels, AccentPhrase, Mora};

fn main() {
    env_logger::init();

    let phrases = vec![
        AccentPhrase {
            moras: vec![
                Mora::new("k", "o"),
                Mora::vowel_only("N"),
                Mora::new("n", "i"),
                Mora::new("ch", "i"),
                Mora::new("w", "a"),
            ],
            accent: 5,
            is_interrogative: false,
            pause_after: true,
        },
        AccentPhrase {
            moras: vec![
                Mora::new("g", "e"),
                Mora::vowel_only("N"),
                Mora::new("k", "i"),
                Mora::new("d", "e"),
                Mora::new("s", "U"),
                Mora::new("k", "a"),
            ],
            accent: 3,
            is_interrogative: true,
            pause_after: false,
        },
    ];

    match full_context_labels(&phrases) {
        Ok(labels) => {
            for line in labels {
                println!("{line}");
            }
        }
        Err(err) => {
            eprintln!("label synthesis failed: {err}");
            std::process::exit(1);
        }
    }
}
