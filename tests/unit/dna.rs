use std::path::PathBuf;

use rand::{SeedableRng, rngs::StdRng};

use super::*;

fn layer(name: &str, weights: &[u32]) -> Layer {
    Layer {
        id: 0,
        name: name.to_string(),
        opacity: 1.0,
        elements: weights
            .iter()
            .enumerate()
            .map(|(id, w)| LayerElement {
                id,
                name: format!("E{id}"),
                filename: format!("E{id}#{w}.png"),
                path: PathBuf::from(format!("E{id}#{w}.png")),
                weight: *w,
            })
            .collect(),
    }
}

#[test]
fn weighted_sampling_converges() {
    let l = layer("L", &[1, 1, 8]);
    let mut rng = StdRng::seed_from_u64(42);
    let n = 10_000;
    let mut hits = [0usize; 3];
    for _ in 0..n {
        hits[pick_element(&l, &mut rng).unwrap().id] += 1;
    }
    let share = hits[2] as f64 / n as f64;
    assert!((share - 0.8).abs() < 0.05, "share of heavy element was {share}");
    assert!(hits[0] > 0 && hits[1] > 0);
}

#[test]
fn zero_weight_elements_are_never_drawn() {
    let l = layer("L", &[0, 5, 0]);
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..500 {
        assert_eq!(pick_element(&l, &mut rng).unwrap().id, 1);
    }
}

#[test]
fn zero_total_weight_is_config_error() {
    let l = layer("L", &[0, 0]);
    let mut rng = StdRng::seed_from_u64(1);
    assert!(pick_element(&l, &mut rng).unwrap_err().is_config());
}

#[test]
fn dna_has_one_strand_per_layer_in_order() {
    let layers = vec![layer("A", &[1, 1]), layer("B", &[3]), layer("C", &[2, 2, 2])];
    let mut rng = StdRng::seed_from_u64(9);
    let dna = create_dna(&layers, &mut rng).unwrap();
    assert_eq!(dna.len(), 3);
    assert_eq!(dna.strands()[1].element_id, 0);
    assert_eq!(dna.strands()[1].filename, "E0#3.png");
    for (strand, l) in dna.strands().iter().zip(&layers) {
        assert!(l.element(strand.element_id).is_some());
    }
}

#[test]
fn same_seed_same_dna() {
    let layers = vec![layer("A", &[1, 2, 3]), layer("B", &[4, 5])];
    let a = create_dna(&layers, &mut StdRng::seed_from_u64(5)).unwrap();
    let b = create_dna(&layers, &mut StdRng::seed_from_u64(5)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn key_joins_strands_without_separator() {
    let dna = Dna::new(vec![
        DnaStrand {
            element_id: 0,
            filename: "A#1.png".to_string(),
        },
        DnaStrand {
            element_id: 3,
            filename: "X#1.png".to_string(),
        },
    ]);
    assert_eq!(dna.key(), "0:A#1.png3:X#1.png");
    assert_eq!(dna.to_string(), dna.key());
}

#[test]
fn dna_set_tracks_membership() {
    let mut set = DnaSet::new();
    let a = Dna::new(vec![DnaStrand {
        element_id: 0,
        filename: "a.png".to_string(),
    }]);
    let b = Dna::new(vec![DnaStrand {
        element_id: 1,
        filename: "b.png".to_string(),
    }]);
    assert!(set.is_empty());
    assert!(set.is_unique(&a));
    assert!(set.record(&a));
    assert!(!set.is_unique(&a));
    assert!(set.is_unique(&b));
    assert!(!set.record(&a));
    assert_eq!(set.len(), 1);
}
