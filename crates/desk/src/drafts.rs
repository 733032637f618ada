//! Draft persistence.

use chrono::{DateTime, Utc};
use listing_desk_core::{Draft, DraftForm, DraftId};
use rand::Rng;

use crate::store::{LocalStore, StoreError, keys};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_SUFFIX_LEN: usize = 9;

/// Generate a draft identifier: the base-36 millisecond timestamp followed by
/// nine random base-36 characters.
#[must_use]
pub fn generate_draft_id(now: DateTime<Utc>) -> DraftId {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
    let mut id = to_base36(millis);

    let mut rng = rand::rng();
    id.extend(
        (0..RANDOM_SUFFIX_LEN)
            .filter_map(|_| BASE36.get(rng.random_range(0..BASE36.len())))
            .map(|&b| char::from(b)),
    );
    DraftId::new(id)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let digit = usize::try_from(value % 36).unwrap_or(0);
        digits.push(BASE36.get(digit).copied().unwrap_or(b'0'));
        value /= 36;
    }
    digits.iter().rev().map(|&b| char::from(b)).collect()
}

/// Saved drafts, oldest first.
#[must_use]
pub fn load_drafts(store: &LocalStore) -> Vec<Draft> {
    store.get_or_log(keys::DRAFTS).unwrap_or_default()
}

/// Append a draft to the saved list.
///
/// # Errors
///
/// Returns `StoreError` if the list cannot be written.
pub fn append_draft(store: &LocalStore, draft: Draft) -> Result<(), StoreError> {
    let mut drafts = load_drafts(store);
    drafts.push(draft);
    store.set(keys::DRAFTS, &drafts)
}

/// The form currently being edited; empty when none is stored.
#[must_use]
pub fn load_form(store: &LocalStore) -> DraftForm {
    store.get_or_log(keys::DRAFT_FORM).unwrap_or_default()
}

/// Replace the form currently being edited.
///
/// # Errors
///
/// Returns `StoreError` if the form cannot be written.
pub fn save_form(store: &LocalStore, form: &DraftForm) -> Result<(), StoreError> {
    store.set(keys::DRAFT_FORM, form)
}

/// Forget the form currently being edited.
///
/// # Errors
///
/// Returns `StoreError` if the store cannot be written.
pub fn reset_form(store: &LocalStore) -> Result<(), StoreError> {
    store.remove(keys::DRAFT_FORM)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_generate_draft_id_shape() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let id = generate_draft_id(now);
        let id = id.as_str();

        assert!(id.starts_with("loyw3v28"));
        assert_eq!(id.len(), 8 + RANDOM_SUFFIX_LEN);
        assert!(id.bytes().all(|b| BASE36.contains(&b)));
        assert_ne!(generate_draft_id(now), generate_draft_id(now));
    }

    #[test]
    fn test_append_preserves_order() {
        let store = LocalStore::in_memory();
        for title in ["first", "second"] {
            let form = DraftForm {
                title: title.to_string(),
                price: "10".to_string(),
                description: "desc".to_string(),
                ..DraftForm::default()
            };
            let draft = form.into_draft(generate_draft_id(Utc::now()), Utc::now()).unwrap();
            append_draft(&store, draft).unwrap();
        }

        let drafts = load_drafts(&store);
        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].title, "first");
        assert_eq!(drafts[1].price, Decimal::from(10));
    }

    #[test]
    fn test_form_round_trip_and_reset() {
        let store = LocalStore::in_memory();
        assert_eq!(load_form(&store), DraftForm::default());

        let form = DraftForm {
            title: "Lamp".to_string(),
            ..DraftForm::default()
        };
        save_form(&store, &form).unwrap();
        assert_eq!(load_form(&store), form);

        reset_form(&store).unwrap();
        assert_eq!(load_form(&store), DraftForm::default());
    }
}
