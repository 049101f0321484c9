use std::collections::{BTreeMap, HashSet};
use std::fmt::Debug;
use std::ops::Bound::{Excluded, Unbounded};

use crate::index::{IndexType, NodeIndex};
use crate::node::{Color, Node};
use rand::{rngs::StdRng, Rng, SeedableRng};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use super::*;

fn init_logger() {
    let _ignore = TermLogger::init(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

struct KeyGenerator {
    rng: StdRng,
    unique: HashSet<i32>,
    limit: i32,
}

impl KeyGenerator {
    fn new(seed: [u8; 32]) -> Self {
        const LIMIT: i32 = 10_000;
        Self {
            rng: SeedableRng::from_seed(seed),
            unique: HashSet::new(),
            limit: LIMIT,
        }
    }

    fn next(&mut self) -> i32 {
        self.rng.gen_range(0..self.limit)
    }

    fn next_unique(&mut self) -> i32 {
        let mut key = self.next();
        while self.unique.contains(&key) {
            key = self.next();
        }
        self.unique.insert(key);
        key
    }
}

impl<K, V, Ix> RbTreeMap<K, V, Ix>
where
    K: Ord + Debug,
    Ix: IndexType,
{
    /// 1. Every node is either red or black.
    /// 2. The root is black.
    /// 3. Every leaf (NIL) is black.
    /// 4. If a node is red, then both its children are black.
    /// 5. For each node, all simple paths from the node to descendant leaves contain the
    /// same number of black nodes.
    pub(crate) fn check_rb_properties(&self) {
        self.check_sentinel();
        assert_eq!(self.nodes.len(), self.len + 1, "arena holds stale nodes");
        let Some(root) = self.root else {
            assert_eq!(self.len, 0);
            return;
        };
        assert!(self.node_ref(root, Node::is_black), "root must be black");
        assert!(self.node_ref(root, Node::parent).is_sentinel());
        self.check_links(root);
        self.check_children_color(root);
        let _ignore = self.check_black_height(root);
        self.check_order();
    }

    fn check_sentinel(&self) {
        let sentinel = &self.nodes[0];
        assert!(sentinel.key.is_none() && sentinel.value.is_none());
        assert_eq!(sentinel.color, Color::Black);
        assert!(sentinel.left.is_sentinel());
        assert!(sentinel.right.is_sentinel());
        assert!(sentinel.parent.is_sentinel());
    }

    fn check_links(&self, x: NodeIndex<Ix>) {
        if x.is_sentinel() {
            return;
        }
        for child in [self.node_ref(x, Node::left), self.node_ref(x, Node::right)] {
            if !child.is_sentinel() {
                assert_eq!(self.node_ref(child, Node::parent), x, "broken parent link");
                self.check_links(child);
            }
        }
    }

    fn check_children_color(&self, x: NodeIndex<Ix>) {
        if x.is_sentinel() {
            return;
        }
        self.check_children_color(self.node_ref(x, Node::left));
        self.check_children_color(self.node_ref(x, Node::right));
        if self.node_ref(x, Node::is_red) {
            assert!(matches!(self.left_ref(x, Node::color), Color::Black));
            assert!(matches!(self.right_ref(x, Node::color), Color::Black));
        }
    }

    fn check_black_height(&self, x: NodeIndex<Ix>) -> usize {
        if x.is_sentinel() {
            return 0;
        }
        let lefth = self.check_black_height(self.node_ref(x, Node::left));
        let righth = self.check_black_height(self.node_ref(x, Node::right));
        assert_eq!(lefth, righth);
        if self.node_ref(x, Node::is_black) {
            return lefth + 1;
        }
        lefth
    }

    fn check_order(&self) {
        let keys: Vec<_> = self.keys().collect();
        assert_eq!(keys.len(), self.len);
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys out of order: {keys:?}");
    }

    fn check_height_bound(&self) {
        let bound = 2.0 * ((self.len + 1) as f64).log2();
        assert!(
            self.height() as f64 <= bound,
            "height {} exceeds {bound} for {} entries",
            self.height(),
            self.len
        );
    }

    fn root_entry(&self) -> (&K, Color) {
        let root = self.root.expect("tree is not empty");
        self.node_ref(root, |n| (n.key(), n.color()))
    }

    fn child_entry(&self, left: bool) -> (&K, Color) {
        let root = self.root.expect("tree is not empty");
        let child = if left {
            self.node_ref(root, Node::left)
        } else {
            self.node_ref(root, Node::right)
        };
        self.node_ref(child, |n| (n.key(), n.color()))
    }
}

fn with_map_and_generator<V>(test_fn: impl Fn(RbTreeMap<i32, V>, KeyGenerator)) {
    init_logger();
    let seeds = vec![[0; 32], [1; 32], [2; 32]];
    for seed in seeds {
        let gen = KeyGenerator::new(seed);
        let map = RbTreeMap::new();
        test_fn(map, gen);
    }
}

#[test]
fn red_black_tree_properties_is_satisfied() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for k in keys.clone() {
            let _ignore = map.insert(k, ());
            map.check_rb_properties();
        }
        map.check_height_bound();
    });
}

#[test]
fn red_black_tree_properties_hold_after_every_remove() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for k in keys.clone() {
            let _ignore = map.insert(k, k);
        }
        for (i, k) in keys.iter().enumerate() {
            assert_eq!(map.remove(k), Some(*k));
            map.check_rb_properties();
            map.check_height_bound();
            assert_eq!(map.len(), keys.len() - i - 1);
        }
        assert!(map.is_empty());
        assert!(map.root.is_none());
    });
}

#[test]
fn map_len_will_update() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(100)
            .collect();
        for k in keys.clone() {
            let _ignore = map.insert(k, ());
        }
        assert_eq!(map.len(), 100);
        for k in keys.clone() {
            let _ignore = map.insert(k, ());
        }
        assert_eq!(map.len(), 100);
        for k in keys {
            let _ignore = map.remove(&k);
        }
        assert_eq!(map.len(), 0);
    });
}

#[test]
fn remove_non_exist_key_will_do_nothing() {
    with_map_and_generator(|mut map, mut gen| {
        let keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for k in keys {
            let _ignore = map.insert(k, ());
        }
        assert_eq!(map.len(), 1000);
        let to_remove: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .take(1000)
            .collect();
        for k in to_remove {
            assert_eq!(map.remove(&k), None);
        }
        assert_eq!(map.len(), 1000);
        map.check_rb_properties();
    });
}

#[test]
fn remove_on_empty_map_returns_none() {
    let mut map: RbTreeMap<i32, i32> = RbTreeMap::new();
    assert_eq!(map.remove(&1), None);
    assert_eq!(map.len(), 0);
    assert!(map.root.is_none());
    map.check_rb_properties();
}

#[test]
fn iterate_through_map_is_sorted() {
    with_map_and_generator(|mut map, mut gen| {
        let mut keys: Vec<_> = std::iter::repeat_with(|| gen.next_unique())
            .enumerate()
            .take(1000)
            .collect();
        for (v, k) in keys.clone() {
            let _ignore = map.insert(k, v);
        }
        keys.sort_unstable_by(|a, b| a.1.cmp(&b.1));

        assert_eq!(map.iter().len(), keys.len());
        for ((ek, ev), (v, k)) in map.iter().zip(keys.iter()) {
            assert_eq!(ek, k);
            assert_eq!(ev, v);
        }
        let owned: Vec<_> = map.into_iter().map(|(k, _)| k).collect();
        let expected: Vec<_> = keys.iter().map(|(_, k)| *k).collect();
        assert_eq!(owned, expected);
    });
}

#[test]
fn into_iter_resumes_after_partial_consumption() {
    let map: RbTreeMap<_, _> = (0..100).map(|k| (k, k * 2)).collect();
    let mut iter = map.into_iter();
    let head: Vec<_> = iter.by_ref().take(40).collect();
    assert_eq!(head.first(), Some(&(0, 0)));
    assert_eq!(head.last(), Some(&(39, 78)));
    assert_eq!(iter.len(), 60);
    let tail: Vec<_> = iter.by_ref().collect();
    assert_eq!(tail.len(), 60);
    assert_eq!(tail.first(), Some(&(40, 80)));
    assert_eq!(tail.last(), Some(&(99, 198)));
    assert_eq!(iter.next(), None);
    assert_eq!(iter.next(), None);
}

#[test]
fn keys_and_values_report_exact_len() {
    let map: RbTreeMap<_, _> = (0..10).map(|k| (k, -k)).collect();
    let mut keys = map.keys();
    assert_eq!(keys.len(), 10);
    assert_eq!(keys.next(), Some(&0));
    assert_eq!(keys.len(), 9);
    let mut values = map.values();
    values.by_ref().for_each(drop);
    assert_eq!(values.len(), 0);
    assert_eq!(values.next(), None);
    assert_eq!(values.next(), None);
}

#[test]
fn mixed_workload_matches_btreemap() {
    with_map_and_generator(|mut map, mut gen| {
        let mut reference = BTreeMap::new();
        for step in 0..5000 {
            let k = gen.next() % 500;
            if gen.rng.gen_bool(0.6) {
                assert_eq!(map.insert(k, step), reference.insert(k, step));
            } else {
                assert_eq!(map.remove(&k), reference.remove(&k));
            }
            assert_eq!(map.len(), reference.len());
            if step % 100 == 0 {
                map.check_rb_properties();
            }
        }
        map.check_rb_properties();
        for k in 0..500 {
            assert_eq!(map.get(&k), reference.get(&k));
        }
        let ours: Vec<_> = map.iter().collect();
        let theirs: Vec<_> = reference.iter().collect();
        assert_eq!(ours, theirs);
    });
}

#[test]
fn predecessor_and_successor_match_btreemap() {
    with_map_and_generator(|mut map, mut gen| {
        let mut reference = BTreeMap::new();
        for _ in 0..300 {
            let k = gen.next_unique();
            map.insert(k, k * 2);
            reference.insert(k, k * 2);
        }
        for _ in 0..1000 {
            let probe = gen.next();
            assert_eq!(map.predecessor(&probe), reference.range(..probe).next_back());
            assert_eq!(
                map.successor(&probe),
                reference.range((Excluded(probe), Unbounded)).next()
            );
        }
        assert_eq!(map.first_key_value(), reference.iter().next());
        assert_eq!(map.last_key_value(), reference.iter().next_back());
    });
}

#[test]
fn overwrite_keeps_structure_and_len() {
    let mut map = RbTreeMap::new();
    map.insert("k", 1);
    map.insert("j", 0);
    let len = map.len();
    let nodes = map.nodes.len();
    assert_eq!(map.insert("k", 2), Some(1));
    assert_eq!(map.get("k"), Some(&2));
    assert_eq!(map.len(), len);
    assert_eq!(map.nodes.len(), nodes);
}

#[test]
fn insert_with_red_uncle_recolors() {
    let mut map = RbTreeMap::new();
    for k in [10, 5, 20] {
        map.insert(k, ());
    }
    assert_eq!(map.root_entry(), (&10, Color::Black));
    assert_eq!(map.child_entry(true), (&5, Color::Red));
    assert_eq!(map.child_entry(false), (&20, Color::Red));

    map.insert(2, ());
    assert_eq!(map.root_entry(), (&10, Color::Black));
    assert_eq!(map.child_entry(true), (&5, Color::Black));
    assert_eq!(map.child_entry(false), (&20, Color::Black));
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![2, 5, 10, 20]);
    map.check_rb_properties();
}

#[test]
fn insert_straight_line_and_zig_zag_rotate() {
    let mut map = RbTreeMap::new();
    for k in [10, 5, 4] {
        map.insert(k, ());
    }
    assert_eq!(map.root_entry(), (&5, Color::Black));
    assert_eq!(map.child_entry(true), (&4, Color::Red));
    assert_eq!(map.child_entry(false), (&10, Color::Red));

    let mut map = RbTreeMap::new();
    for k in [10, 5, 7] {
        map.insert(k, ());
    }
    assert_eq!(map.root_entry(), (&7, Color::Black));
    assert_eq!(map.child_entry(true), (&5, Color::Red));
    assert_eq!(map.child_entry(false), (&10, Color::Red));

    let mut map = RbTreeMap::new();
    for k in [1, 3, 2] {
        map.insert(k, ());
    }
    assert_eq!(map.root_entry(), (&2, Color::Black));
    map.check_rb_properties();
}

#[test]
fn remove_red_leaf_then_black_node_with_red_child() {
    let mut map = RbTreeMap::new();
    for k in [50, 25, 75, 13, 20] {
        map.insert(k, ());
    }
    map.check_rb_properties();
    assert_eq!(map.remove(&25), Some(()));
    map.check_rb_properties();
    assert_eq!(map.remove(&20), Some(()));
    map.check_rb_properties();
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![13, 50, 75]);
    assert_eq!(map.len(), 3);
    assert_eq!(map.root_entry(), (&50, Color::Black));
    assert_eq!(map.child_entry(true), (&13, Color::Black));
}

#[test]
fn remove_with_red_far_nephew_rotates_once() {
    let mut map = RbTreeMap::new();
    for k in [20, 25, 10, 30] {
        map.insert(k, ());
    }
    assert_eq!(map.remove(&10), Some(()));
    map.check_rb_properties();
    assert_eq!(map.root_entry(), (&25, Color::Black));
    assert_eq!(map.child_entry(true), (&20, Color::Black));
    assert_eq!(map.child_entry(false), (&30, Color::Black));
}

#[test]
fn remove_with_red_near_nephew_rotates_twice() {
    let mut map = RbTreeMap::new();
    for k in [20, 10, 30, 25] {
        map.insert(k, ());
    }
    assert_eq!(map.remove(&20), Some(()));
    map.check_rb_properties();
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![10, 25, 30]);
    assert_eq!(map.root_entry(), (&25, Color::Black));
}

#[test]
fn remove_with_black_nephews_propagates_up() {
    let mut map = RbTreeMap::new();
    for k in [20, 16, 24, 23, 25, 26] {
        map.insert(k, ());
    }
    assert_eq!(map.remove(&26), Some(()));
    assert_eq!(map.remove(&24), Some(()));
    map.check_rb_properties();
    assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![16, 20, 23, 25]);
    assert_eq!(map.child_entry(false), (&23, Color::Black));
}

#[test]
fn remove_with_red_sibling_rotates_parent() {
    let mut map = RbTreeMap::new();
    for k in [10, 5, 20, 15, 25, 30] {
        map.insert(k, ());
    }
    assert_eq!(map.child_entry(false), (&20, Color::Red));
    assert_eq!(map.remove(&5), Some(()));
    map.check_rb_properties();
    assert_eq!(map.root_entry(), (&20, Color::Black));
    assert_eq!(map.child_entry(true), (&10, Color::Black));
    assert_eq!(
        map.keys().copied().collect::<Vec<_>>(),
        vec![10, 15, 20, 25, 30]
    );
}

#[test]
fn remove_two_children_returns_removed_value() {
    let mut map = RbTreeMap::new();
    for k in 0..15 {
        map.insert(k, k * 10);
    }
    let root = *map.root_entry().0;
    assert_eq!(map.remove_entry(&root), Some((root, root * 10)));
    assert_eq!(map.get(&root), None);
    for k in (0..15).filter(|k| *k != root) {
        assert_eq!(map.get(&k), Some(&(k * 10)));
    }
    map.check_rb_properties();
}

#[test]
fn relational_helpers_report_missing_relatives() {
    let mut map = RbTreeMap::new();
    for k in [10, 5, 20, 2] {
        map.insert(k, ());
    }
    let root = map.root.expect("tree is not empty");
    let (_, two) = map.search(&2);
    let two = two.expect("2 is present");
    let (_, five) = map.search(&5);
    let five = five.expect("5 is present");
    let (_, twenty) = map.search(&20);
    let twenty = twenty.expect("20 is present");

    assert_eq!(map.parent_of(root), None);
    assert_eq!(map.sibling_of(root), None);
    assert_eq!(map.grand_parent_of(five), None);
    assert_eq!(map.uncle_of(five), None);
    assert_eq!(map.parent_of(two), Some(five));
    assert_eq!(map.grand_parent_of(two), Some(root));
    assert_eq!(map.uncle_of(two), Some(twenty));
    assert_eq!(map.sibling_of(five), Some(twenty));
    assert_eq!(map.sibling_of(two), Some(NodeIndex::SENTINEL));
}

#[test]
fn search_reports_insertion_parent() {
    let mut map = RbTreeMap::new();
    assert_eq!(map.search(&1), (NodeIndex::SENTINEL, None));
    for k in [10, 5, 20] {
        map.insert(k, ());
    }
    let (_, five) = map.search(&5);
    let (parent, found) = map.search(&7);
    assert_eq!(found, None);
    assert_eq!(Some(parent), five);
}

#[test]
fn borrowed_keys_can_be_used_for_lookup() {
    let mut map = RbTreeMap::new();
    map.insert(String::from("apple"), 1);
    map.insert(String::from("banana"), 2);
    map.insert(String::from("cherry"), 3);
    assert_eq!(map.get("banana"), Some(&2));
    assert!(map.contains_key("cherry"));
    assert_eq!(map.successor("apple"), Some((&String::from("banana"), &2)));
    assert_eq!(map.remove("apple"), Some(1));
    assert!(!map.contains_key("apple"));
}

#[test]
fn entry_api_inserts_and_removes() {
    let mut map = RbTreeMap::new();
    for word in ["a", "b", "a", "c", "a", "b"] {
        *map.entry(word).or_insert(0) += 1;
    }
    assert_eq!(map.get("a"), Some(&3));
    assert_eq!(map.get("b"), Some(&2));
    assert_eq!(map.get("c"), Some(&1));
    assert_eq!(map.entry("z").key(), &"z");

    match map.entry("b") {
        Entry::Occupied(mut entry) => {
            assert_eq!(entry.insert(7), 2);
            assert_eq!(entry.get(), &7);
            assert_eq!(entry.remove(), 7);
        }
        Entry::Vacant(_) => panic!("b is present"),
    }
    assert_eq!(map.len(), 2);
    map.check_rb_properties();
}

#[test]
fn rb_tree_map_clear_is_ok() {
    let mut map = RbTreeMap::new();
    map.insert(1, 1);
    map.insert(2, 2);
    map.insert(6, 3);
    assert_eq!(map.len(), 3);
    map.clear();
    assert_eq!(map.len(), 0);
    assert!(map.is_empty());
    assert!(map.root.is_none());
    assert_eq!(map.nodes.len(), 1);
    assert!(map.nodes[0].key.is_none());
    map.insert(4, 4);
    map.check_rb_properties();
}

#[test]
fn usize_index_map_is_balanced() {
    let mut map: RbTreeMap<u64, u64, usize> = RbTreeMap::with_capacity(256);
    for k in 0..256 {
        map.insert(k, k);
    }
    map.check_rb_properties();
    map.check_height_bound();
    for k in (0..256).step_by(2) {
        assert_eq!(map.remove(&k), Some(k));
    }
    map.check_rb_properties();
    assert_eq!(map.len(), 128);
}

#[derive(Copy, Clone, Default, Hash, PartialEq, Eq, PartialOrd, Ord, Debug)]
struct ByteIx(u8);

unsafe impl IndexType for ByteIx {
    const ZERO: Self = ByteIx(0);
    fn new(x: usize) -> Self {
        ByteIx(x as u8)
    }
    fn index(&self) -> usize {
        self.0 as usize
    }
    fn max() -> Self {
        ByteIx(u8::MAX)
    }
}

#[test]
#[should_panic(expected = "Reached maximum number of nodes")]
fn insert_past_index_capacity_panics() {
    let mut map: RbTreeMap<u32, (), ByteIx> = RbTreeMap::default();
    // slot 0 is the sentinel and slot 255 is the end marker
    for k in 0..254 {
        assert_eq!(map.insert(k, ()), None);
        map.check_rb_properties();
    }
    assert_eq!(map.len(), 254);
    map.check_height_bound();
    // overwrites and removals never need a fresh slot
    assert_eq!(map.insert(0, ()), Some(()));
    assert_eq!(map.remove(&0), Some(()));
    assert_eq!(map.insert(1000, ()), None);
    map.check_rb_properties();
    let _ignore = map.insert(1001, ());
}

#[test]
fn sync_map_survives_concurrent_access() {
    init_logger();
    let map = SyncRbTreeMap::new();
    let writers: Vec<_> = (0..4)
        .map(|t| {
            let map = map.clone();
            std::thread::spawn(move || {
                let mut rng = StdRng::seed_from_u64(t);
                for _ in 0..2000 {
                    let k = rng.gen_range(0..1000);
                    if rng.gen_bool(0.7) {
                        map.insert(k, k * 3);
                    } else {
                        map.remove(&k);
                    }
                }
            })
        })
        .collect();
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let map = map.clone();
            std::thread::spawn(move || {
                for k in 0..1000 {
                    if let Some(v) = map.get(&k) {
                        assert_eq!(v, k * 3);
                    }
                }
            })
        })
        .collect();
    for handle in writers.into_iter().chain(readers) {
        handle.join().unwrap();
    }
    map.read(|m| m.check_rb_properties());
    let len = map.len();
    let inner = map.try_into_inner().unwrap();
    assert_eq!(inner.len(), len);
}

#[test]
fn sync_map_release_on_early_return() {
    let map = SyncRbTreeMap::new();
    assert_eq!(map.remove(&1), None);
    assert_eq!(map.insert(1, "a"), None);
    assert_eq!(map.insert(1, "b"), Some("a"));
    assert_eq!(map.get(&2), None);
    // every call above released its guard, otherwise this would deadlock
    map.write(|m| m.insert(2, "c"));
    assert_eq!(map.first_key_value(), Some((1, "b")));
    assert_eq!(map.last_key_value(), Some((2, "c")));
    assert_eq!(map.successor(&1), Some((2, "c")));
    assert_eq!(map.predecessor(&1), None);
    map.clear();
    assert!(map.is_empty());
}

#[test]
fn sync_map_recovers_from_poisoned_lock() {
    let map = SyncRbTreeMap::new();
    map.insert(1, 1);
    let writer = {
        let map = map.clone();
        std::thread::spawn(move || {
            map.write(|m| {
                m.insert(2, 2);
                panic!("writer panicked while holding the lock");
            })
        })
    };
    assert!(writer.join().is_err());

    assert_eq!(map.get(&2), Some(2));
    assert_eq!(map.insert(3, 3), None);
    assert_eq!(map.len(), 3);
    map.read(|m| m.check_rb_properties());
    let inner = map.try_into_inner().unwrap();
    assert_eq!(inner.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[cfg(feature = "serde")]
#[test]
fn test_serde_rb_tree_map() {
    use serde_json::{json, Value};

    let mut map = RbTreeMap::<i32, i32>::new();
    map.insert(2, 20);
    map.insert(1, 10);
    map.insert(3, 30);

    // Serialize the map to JSON
    let serialized = serde_json::to_string(&map).unwrap();
    let expected = json!({
        "nodes": [
            // sentinel node
            {
                "left": 0,
                "right": 0,
                "parent": 0,
                "color": "Black",
                "key": null,
                "value": null
            },
            {
                "left": 2,
                "right": 3,
                "parent": 0,
                "color": "Black",
                "key": 2,
                "value": 20
            },
            {
                "left": 0,
                "right": 0,
                "parent": 1,
                "color": "Red",
                "key": 1,
                "value": 10
            },
            {
                "left": 0,
                "right": 0,
                "parent": 1,
                "color": "Red",
                "key": 3,
                "value": 30
            }
        ],
        "root": 1,
        "len": 3
    });
    let actual: Value = serde_json::from_str(&serialized).unwrap();
    assert_eq!(expected, actual);

    // Deserialize the map from JSON
    let deserialized: RbTreeMap<i32, i32> = serde_json::from_str(&serialized).unwrap();
    let dv: Vec<_> = deserialized.iter().collect();
    let ev: Vec<_> = map.iter().collect();

    assert_eq!(ev, dv);
    deserialized.check_rb_properties();
}

#[cfg(feature = "serde")]
#[test]
fn test_serde_rejects_malformed_layout() {
    use serde_json::{json, Value};

    let map: RbTreeMap<i32, i32> = [(2, 20), (1, 10), (3, 30)].into_iter().collect();
    let layout = serde_json::to_value(&map).unwrap();
    let load = |value: Value| serde_json::from_value::<RbTreeMap<i32, i32>>(value);
    assert!(load(layout.clone()).is_ok());

    let mut root_out_of_range = layout.clone();
    root_out_of_range["root"] = json!(9);
    let err = load(root_out_of_range).unwrap_err();
    assert!(err.to_string().contains("invalid root"));

    let mut child_out_of_range = layout.clone();
    child_out_of_range["nodes"][1]["left"] = json!(42);
    let err = load(child_out_of_range).unwrap_err();
    assert!(err.to_string().contains("out of range"));

    let mut wrong_len = layout.clone();
    wrong_len["len"] = json!(5);
    let err = load(wrong_len).unwrap_err();
    assert!(err.to_string().contains("does not match"));

    let mut broken_parent = layout.clone();
    broken_parent["nodes"][2]["parent"] = json!(3);
    let err = load(broken_parent).unwrap_err();
    assert!(err.to_string().contains("does not point back"));

    let mut keyed_sentinel = layout;
    keyed_sentinel["nodes"][0]["key"] = json!(7);
    let err = load(keyed_sentinel).unwrap_err();
    assert!(err.to_string().contains("malformed sentinel"));
}
