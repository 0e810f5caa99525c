use super::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

fn hash_of(m: &Meta) -> u64 {
    let mut h = DefaultHasher::new();
    m.hash(&mut h);
    h.finish()
}

#[test]
fn equal_values_hash_equal() {
    let a = Meta::Double(1.5);
    let b = Meta::Double(1.5);
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn nan_is_reflexively_equal_by_bit_pattern() {
    let nan = Meta::Double(f64::NAN);
    assert_eq!(nan, nan.clone());
}

#[test]
fn clone_shares_the_backing_cell_but_deep_clone_does_not() {
    let s = Meta::String(Rc::new(RefCell::new("hi".to_string())));
    let shallow = s.clone();
    if let Meta::String(cell) = &shallow {
        *cell.borrow_mut() = "bye".to_string();
    }
    assert_eq!(s, shallow);

    let deep = s.deep_clone();
    if let (Meta::String(a), Meta::String(b)) = (&s, &deep) {
        *a.borrow_mut() = "changed".to_string();
        assert_ne!(*a.borrow(), *b.borrow());
    }
}

#[test]
fn assign_in_place_is_observed_through_every_alias() {
    let slot = Meta::String(Rc::new(RefCell::new("old".to_string())));
    let alias = slot.clone();
    let new_value = Meta::String(Rc::new(RefCell::new("new".to_string())));
    assert!(slot.assign_in_place(&new_value));
    assert_eq!(alias, new_value);
}
