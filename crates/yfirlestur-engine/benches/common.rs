// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_paragraphs(count: usize) -> String {
    let base = [
        "Ég fór til Reykjavikur í gær og keypti mér nýjan hest",
        "Teh quick brown fox jumps over the lazy dog",
        "Hún sagdi að veðrið væri gott en það rigndi allan daginn",
    ];
    (0..count)
        .map(|i| base[i % base.len()])
        .collect::<Vec<_>>()
        .join("\n")
}

/// Corrected version of [`generate_paragraphs`]: one word changed per paragraph
#[allow(dead_code)]
pub fn corrected_paragraph(text: &str) -> String {
    text.replace("Reykjavikur", "Reykjavíkur")
        .replace("Teh", "The")
        .replace("sagdi", "sagði")
}
