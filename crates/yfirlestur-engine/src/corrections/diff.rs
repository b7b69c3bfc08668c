use crate::corrections::{CorrectionId, CorrectionKind, CorrectionRecord};
use crate::editing::ParagraphId;

/// Stands in for a missing neighbour word in the context strings
pub const ELLIPSIS: &str = "...";

const WORD_SEPARATOR: char = ' ';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    #[error("Paragraph has {original} words but the corrected text has {corrected}")]
    WordCountMismatch { original: usize, corrected: usize },
}

/// Compare a paragraph with its corrected version word by word.
///
/// Both texts are split on single spaces and compared index by index; no
/// insertion or deletion alignment is attempted, so the word counts have to
/// match. `paragraph_pos` is the paragraph's position in the document, its text
/// starting one byte later. Each mismatching word yields one record whose span
/// covers the original word.
pub fn diff_paragraph(
    paragraph: ParagraphId,
    paragraph_pos: usize,
    original: &str,
    corrected: &str,
) -> Result<Vec<CorrectionRecord>, DiffError> {
    let original_words: Vec<&str> = original.split(WORD_SEPARATOR).collect();
    let corrected_words: Vec<&str> = corrected.split(WORD_SEPARATOR).collect();

    if original_words.len() != corrected_words.len() {
        return Err(DiffError::WordCountMismatch {
            original: original_words.len(),
            corrected: corrected_words.len(),
        });
    }

    let mut records = Vec::new();
    let mut word_start = 0;
    for (j, (word, replacement)) in original_words.iter().zip(&corrected_words).enumerate() {
        if word != replacement {
            let from = paragraph_pos + word_start + 1;
            let to = from + word.len();
            records.push(CorrectionRecord {
                id: CorrectionId::new(paragraph, from, to),
                kind: CorrectionKind::Correction,
                from,
                to,
                before_text: word.to_string(),
                after_text: replacement.to_string(),
                context_before: context(
                    j.checked_sub(2).and_then(|i| neighbour(&original_words, i)),
                    j.checked_sub(1).and_then(|i| neighbour(&original_words, i)),
                ),
                context_after: context(
                    neighbour(&original_words, j + 1),
                    neighbour(&original_words, j + 2),
                ),
            });
        }
        word_start += word.len() + 1;
    }

    Ok(records)
}

/// Empty strings between doubled spaces count as missing neighbours
fn neighbour<'a>(words: &[&'a str], index: usize) -> Option<&'a str> {
    words.get(index).copied().filter(|word| !word.is_empty())
}

/// `outer` followed by a space when present, then `inner` or the ellipsis
fn context(outer: Option<&str>, inner: Option<&str>) -> String {
    let mut text = String::new();
    if let Some(outer) = outer {
        text.push_str(outer);
        text.push(' ');
    }
    text.push_str(inner.unwrap_or(ELLIPSIS));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::{Document, HostDocument};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use uuid::Uuid;

    fn paragraph() -> ParagraphId {
        ParagraphId(Uuid::nil())
    }

    #[test]
    fn test_identical_text_yields_nothing() {
        let records = diff_paragraph(
            paragraph(),
            0,
            "The quick brown fox",
            "The quick brown fox",
        )
        .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_single_substitution_at_start() {
        let records = diff_paragraph(
            paragraph(),
            0,
            "Teh quick brown fox",
            "The quick brown fox",
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.before_text, "Teh");
        assert_eq!(record.after_text, "The");
        assert_eq!(record.context_before, "...");
        assert_eq!(record.context_after, "quick brown");
        assert_eq!((record.from, record.to), (1, 4));
        assert_eq!(record.id, CorrectionId::new(paragraph(), 1, 4));
        assert_eq!(record.kind, CorrectionKind::Correction);
    }

    #[rstest]
    #[case::second_word(1, "Teh", "brown fox")]
    #[case::middle(2, "Teh quick", "fox jumps")]
    #[case::second_to_last(3, "quick brown", "jumps ...")]
    #[case::last(4, "brown fox", "...")]
    fn test_context_window(
        #[case] index: usize,
        #[case] expected_before: &str,
        #[case] expected_after: &str,
    ) {
        let original = "Teh quick brown fox jumps";
        let mut corrected: Vec<&str> = original.split(' ').collect();
        corrected[index] = "X";

        let records = diff_paragraph(paragraph(), 0, original, &corrected.join(" ")).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].context_before, expected_before);
        assert_eq!(records[0].context_after, expected_after);
    }

    #[test]
    fn test_spans_point_at_original_words_in_document() {
        let doc = Document::from_text("Fyrsta lína\nÉg fór til Reykjavikur í gær");
        let view = doc.paragraphs()[1].clone();

        let records = diff_paragraph(
            view.id,
            view.pos,
            &view.text,
            "Ég fór til Reykjavíkur í gær",
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(doc.slice(records[0].from..records[0].to), "Reykjavikur");
        assert_eq!(records[0].after_text, "Reykjavíkur");
        assert_eq!(records[0].context_before, "fór til");
        assert_eq!(records[0].context_after, "í gær");
    }

    #[test]
    fn test_multiple_substitutions_track_offsets() {
        let records = diff_paragraph(paragraph(), 10, "a bb ccc dddd", "a BB ccc DDDD").unwrap();

        let spans: Vec<(usize, usize, &str)> = records
            .iter()
            .map(|r| (r.from, r.to, r.before_text.as_str()))
            .collect();
        insta::assert_debug_snapshot!(spans, @r#"
        [
            (
                13,
                15,
                "bb",
            ),
            (
                20,
                24,
                "dddd",
            ),
        ]
        "#);
    }

    #[test]
    fn test_doubled_space_counts_as_missing_neighbour() {
        let records = diff_paragraph(paragraph(), 0, "one  two", "one  TWO").unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!((records[0].from, records[0].to), (6, 9));
        assert_eq!(records[0].context_before, "one ...");
    }

    #[test]
    fn test_word_count_mismatch_fails_soft() {
        let result = diff_paragraph(paragraph(), 0, "alveg rétt", "alveg alveg rétt");
        assert_eq!(
            result,
            Err(DiffError::WordCountMismatch {
                original: 2,
                corrected: 3
            })
        );
    }
}
