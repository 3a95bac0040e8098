use uniqprops_core::DuplicateKeyTracker;

fn main() {
    println!("🔍 uniqprops duplicate order\n");

    let sequences: [&[(&str, &str)]; 2] = [
        &[("alpha", "val1"), ("beta", "val2"), ("alpha", "val1"), ("beta", "val2")],
        &[("beta", "val2"), ("alpha", "val1"), ("beta", "val2"), ("alpha", "val1")],
    ];

    for (n, sequence) in sequences.iter().enumerate() {
        let tracker = DuplicateKeyTracker::new();
        for (key, value) in sequence.iter() {
            tracker.assign(*key, *value);
        }

        let keys: Vec<&str> = sequence.iter().map(|(k, _)| *k).collect();
        println!("Sequence {}: {}", n + 1, keys.join(", "));
        for entry in tracker.duplicates() {
            println!("  {} ({} occurrences)", entry.key, entry.occurrences());
        }
    }
}
