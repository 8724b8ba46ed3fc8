// Shared essay generators. Each bench binary compiles this module and uses a
// different subset, hence the dead_code allowances.
use scorewise_engine::{CorrectionSet, Span};

#[allow(dead_code)]
pub fn generate_essay(paragraphs: usize) -> String {
    let base = "Nowadays technology have change the way student learns. Many people thinks that online class is more better than traditional school, but I am not agree.\n\n";
    base.repeat(paragraphs)
}

/// Teacher-edited version of [`generate_essay`]: a few word fixes per paragraph.
#[allow(dead_code)]
pub fn generate_edited_essay(paragraphs: usize) -> String {
    generate_essay(paragraphs)
        .replace("have change", "has changed")
        .replace("student learns", "students learn")
        .replace("more better", "better")
        .replace("am not agree", "do not agree")
}

/// Four-char corrections starting every `every` chars.
#[allow(dead_code)]
pub fn generate_corrections(essay: &str, every: usize) -> CorrectionSet {
    let len = essay.chars().count();
    let mut set = CorrectionSet::new();
    let mut start = 0;
    while start + 4 <= len {
        set.create(essay, Span::new(start, start + 4), "fix", None)
            .unwrap();
        start += every.max(5);
    }
    set
}
