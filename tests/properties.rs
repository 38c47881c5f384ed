use piecetext::Editor;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn random_bytes(rng: &mut impl Rng, n: usize) -> Vec<u8> {
    (0..n).map(|_| rng.gen_range(b'a'..=b'z')).collect()
}

/// Properties 1 (length conservation) and 2 (undo/redo inverse): a random
/// insert/delete sequence, one snapshot per edit, must track a plain `Vec<u8>`
/// reference exactly, both forwards and through a full undo/redo walk.
/// Piece ranges can only stay disjoint (property 4) if every edit keeps
/// producing the right bytes, so this also exercises that property
/// indirectly: any overlap would show up as wrong content.
#[test]
fn random_edit_sequence_matches_reference_and_undo_redo_inverts() {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let mut ed = Editor::new();
    let mut reference: Vec<u8> = Vec::new();
    let mut states: Vec<Vec<u8>> = vec![reference.clone()];

    for _ in 0..300 {
        let len = reference.len() as u64;
        if len == 0 || rng.gen_bool(0.6) {
            let pos = rng.gen_range(0..=len);
            let n = rng.gen_range(1..=8);
            let bytes = random_bytes(&mut rng, n);
            assert!(ed.insert(pos, &bytes));
            reference.splice(pos as usize..pos as usize, bytes.iter().copied());
        } else {
            let pos = rng.gen_range(0..len);
            let max = (len - pos).min(8);
            let n = rng.gen_range(1..=max.max(1));
            assert!(ed.delete(pos, n));
            reference.splice(pos as usize..(pos + n) as usize, std::iter::empty());
        }
        ed.snapshot();

        assert_eq!(ed.len(), reference.len() as u64, "length conservation");
        assert_eq!(ed.to_vec(), reference, "document diverged from reference");
        states.push(reference.clone());
    }

    for state in states.iter().rev().skip(1) {
        assert!(ed.undo());
        assert_eq!(&ed.to_vec(), state);
    }
    assert!(!ed.undo());

    for state in states.iter().skip(1) {
        assert!(ed.redo());
        assert_eq!(&ed.to_vec(), state);
    }
    assert!(!ed.redo());
}

/// Property 3: repeating undo-then-redo with no intervening edit is the
/// identity, for any number of repetitions.
#[test]
fn undo_redo_cycle_is_idempotent() {
    let mut ed = Editor::new();
    ed.insert(0, b"hello");
    ed.snapshot();
    ed.insert(5, b" world");
    ed.snapshot();
    let content = ed.to_vec();

    for _ in 0..5 {
        assert!(ed.undo());
        assert!(ed.redo());
        assert_eq!(ed.to_vec(), content);
    }
}

/// Property 5: `load(save(D))` reproduces `D` exactly, for a document built
/// from a mix of insert/delete/replace so the saved bytes come from more
/// than one backing buffer.
#[test]
fn save_round_trip() {
    let mut ed = Editor::new();
    ed.insert(0, b"hello world");
    ed.delete(5, 1);
    ed.insert(5, b"_");
    ed.replace(0, b"HELLO", 5);
    let content = ed.to_vec();

    let tmp = tempfile::NamedTempFile::new().unwrap();
    ed.save(tmp.path()).unwrap();
    assert!(!ed.modified());

    let loaded = Editor::load(tmp.path()).unwrap();
    assert_eq!(loaded.to_vec(), content);
}

/// Property 5, empty-document edge case.
#[test]
fn save_round_trip_empty_document() {
    let mut ed = Editor::new();
    let tmp = tempfile::NamedTempFile::new().unwrap();
    ed.save(tmp.path()).unwrap();

    let loaded = Editor::load(tmp.path()).unwrap();
    assert_eq!(loaded.to_vec(), Vec::<u8>::new());
}

/// Property 6: consecutive single-character inserts at strictly increasing
/// adjacent positions coalesce into one undo step, however many there are.
#[test]
fn cache_coalesces_many_adjacent_inserts_into_one_undo_step() {
    let mut ed = Editor::new();
    for (i, byte) in (b'a'..=b'z').enumerate() {
        assert!(ed.insert(i as u64, &[byte]));
    }
    assert_eq!(ed.to_vec(), (b'a'..=b'z').collect::<Vec<u8>>());
    assert!(ed.undo());
    assert_eq!(ed.to_vec(), b"");
    assert!(!ed.undo());
}

/// Property 7: editing after an undo drops the redo stack, freeing its
/// former top rather than leaving it reachable.
#[test]
fn redo_invalidated_after_edit_following_undo() {
    let mut ed = Editor::new();
    ed.insert(0, b"a");
    ed.snapshot();
    ed.insert(1, b"b");
    ed.snapshot();

    assert!(ed.undo());
    assert_eq!(ed.to_vec(), b"a");

    assert!(ed.insert(1, b"c"));
    assert_eq!(ed.to_vec(), b"ac");
    assert!(!ed.redo());
}
