use crate::corrections::{CorrectionId, CorrectionRecord};

/// The UI side that displays pending corrections
pub trait CorrectionSink {
    fn add_correction(&mut self, record: &CorrectionRecord);
    fn remove_correction(&mut self, id: &CorrectionId);
    /// The user focused a correction in the text
    fn select_correction(&mut self, id: &CorrectionId);
}

/// Flat collection of visible corrections keyed by id, in arrival order
#[derive(Debug, Clone, Default)]
pub struct CorrectionList {
    records: Vec<CorrectionRecord>,
    selected: Option<CorrectionId>,
}

impl CorrectionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &CorrectionId) -> Option<&CorrectionRecord> {
        self.records.iter().find(|r| r.id == *id)
    }

    pub fn records(&self) -> &[CorrectionRecord] {
        &self.records
    }

    pub fn selected(&self) -> Option<&CorrectionRecord> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records sorted by `position`, the current start of each correction in
    /// the document. A record's `from` is only where it sat when it was diffed,
    /// so it is used only for records `position` cannot place.
    pub fn in_document_order(
        &self,
        position: impl Fn(&CorrectionId) -> Option<usize>,
    ) -> Vec<&CorrectionRecord> {
        let mut records: Vec<(usize, &CorrectionRecord)> = self
            .records
            .iter()
            .map(|r| (position(&r.id).unwrap_or(r.from), r))
            .collect();
        records.sort_by_key(|(pos, _)| *pos);
        records.into_iter().map(|(_, r)| r).collect()
    }

    /// The record `step` places away from the selected one in document
    /// order, wrapping around
    pub fn cycle(
        &self,
        step: isize,
        position: impl Fn(&CorrectionId) -> Option<usize>,
    ) -> Option<CorrectionId> {
        let ordered = self.in_document_order(position);
        if ordered.is_empty() {
            return None;
        }
        let len = ordered.len() as isize;
        let next = match self
            .selected
            .and_then(|id| ordered.iter().position(|r| r.id == id))
        {
            Some(current) => (current as isize + step).rem_euclid(len),
            None if step < 0 => len - 1,
            None => 0,
        };
        Some(ordered[next as usize].id)
    }
}

impl CorrectionSink for CorrectionList {
    fn add_correction(&mut self, record: &CorrectionRecord) {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record.clone(),
            None => self.records.push(record.clone()),
        }
    }

    fn remove_correction(&mut self, id: &CorrectionId) {
        self.records.retain(|r| r.id != *id);
        if self.selected == Some(*id) {
            self.selected = None;
        }
    }

    fn select_correction(&mut self, id: &CorrectionId) {
        self.selected = Some(*id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corrections::diff_paragraph;
    use crate::editing::ParagraphId;
    use pretty_assertions::assert_eq;

    fn list() -> CorrectionList {
        let mut list = CorrectionList::new();
        let records = diff_paragraph(ParagraphId::new(), 0, "a b c d", "A b C D").unwrap();
        // Arrival order differs from document order
        for record in records.iter().rev() {
            list.add_correction(record);
        }
        list
    }

    #[test]
    fn test_add_replaces_record_with_same_id() {
        let mut list = list();
        let mut record = list.records()[0].clone();
        record.after_text = "Z".to_string();

        list.add_correction(&record);

        assert_eq!(list.len(), 3);
        assert_eq!(list.get(&record.id).unwrap().after_text, "Z");
    }

    #[test]
    fn test_remove_clears_selection() {
        let mut list = list();
        let id = list.records()[1].id;
        list.select_correction(&id);
        assert_eq!(list.selected().map(|r| r.id), Some(id));

        list.remove_correction(&id);

        assert_eq!(list.len(), 2);
        assert!(list.selected().is_none());
    }

    fn unplaced(_: &CorrectionId) -> Option<usize> {
        None
    }

    fn words(records: Vec<&CorrectionRecord>) -> Vec<&str> {
        records.iter().map(|r| r.before_text.as_str()).collect()
    }

    #[test]
    fn test_cycle_follows_document_order() {
        let mut list = list();
        assert_eq!(words(list.in_document_order(unplaced)), vec!["a", "c", "d"]);

        let first = list.cycle(1, unplaced).unwrap();
        assert_eq!(list.get(&first).unwrap().before_text, "a");
        list.select_correction(&first);

        let second = list.cycle(1, unplaced).unwrap();
        assert_eq!(list.get(&second).unwrap().before_text, "c");

        let wrapped = list.cycle(-1, unplaced).unwrap();
        assert_eq!(list.get(&wrapped).unwrap().before_text, "d");
    }

    #[test]
    fn test_order_uses_current_positions_over_diff_offsets() {
        let list = list();
        // "a" has since moved past the others
        let moved = |id: &CorrectionId| match list.get(id).map(|r| r.before_text.as_str()) {
            Some("a") => Some(100),
            _ => None,
        };

        assert_eq!(words(list.in_document_order(moved)), vec!["c", "d", "a"]);
        let last = list.cycle(-1, moved).unwrap();
        assert_eq!(list.get(&last).unwrap().before_text, "a");
    }

    #[test]
    fn test_cycle_on_empty_list() {
        assert_eq!(CorrectionList::new().cycle(1, unplaced), None);
    }
}
