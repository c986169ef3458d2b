//! Key uniqueness check

use anyhow::{Result, bail};
use keyprobe::{KeyEncoding, find_key_collisions, generate_key};

pub fn run(docs: u64, encodings: Vec<KeyEncoding>) -> Result<()> {
    let encodings = if encodings.is_empty() {
        KeyEncoding::ALL.to_vec()
    } else {
        encodings
    };

    let mut failed = false;
    for encoding in encodings {
        let collisions = find_key_collisions(encoding, docs);
        if collisions.is_empty() {
            println!("{encoding}: {docs} keys, no collisions");
            continue;
        }
        failed = true;
        println!("{encoding}: {docs} keys, {} collisions", collisions.len());
        for (first, second) in collisions.iter().take(10) {
            println!(
                "  ordinals {first} and {second} share key {}",
                generate_key(*first, encoding)
            );
        }
    }
    if failed {
        bail!("Key collisions found");
    }
    Ok(())
}
