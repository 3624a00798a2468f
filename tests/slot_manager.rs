use dscluster::manager::SlotManager;
use dscluster::node::Node;
use dscluster::slot::{slot_of, SLOTS};

fn nodes(n: usize) -> Vec<Node> {
    (0..n).map(|i| Node::new(format!("n{i}"))).collect()
}

#[test]
fn init_reproduces_reference_tables() {
    let cases: &[(usize, &[(u16, u16)])] = &[
        (1, &[(0, 16383)]),
        (3, &[(0, 5460), (5461, 10922), (10923, 16383)]),
        (
            5,
            &[
                (0, 3276),
                (3277, 6553),
                (6554, 9829),
                (9830, 13106),
                (13107, 16383),
            ],
        ),
        (
            7,
            &[
                (0, 2340),
                (2341, 4680),
                (4681, 7021),
                (7022, 9361),
                (9362, 11702),
                (11703, 14042),
                (14043, 16383),
            ],
        ),
    ];

    for &(n, expected) in cases {
        let manager = SlotManager::init(nodes(n)).unwrap();
        let ranges: Vec<(u16, u16)> = manager
            .nodes()
            .iter()
            .map(|node| (node.slots.start, node.slots.end))
            .collect();
        assert_eq!(ranges, expected, "n={n}");
    }
}

#[test]
fn coverage_is_exact_for_every_cluster_size() {
    for n in [1usize, 2, 3, 4, 5, 6, 7, 13, 200] {
        let manager = SlotManager::init(nodes(n)).unwrap();
        let total: u32 = manager.nodes().iter().map(|n| n.slots.len()).sum();
        assert_eq!(total, SLOTS as u32);
        assert_eq!(manager.nodes()[0].slots.start, 0);
        assert_eq!(manager.nodes().last().unwrap().slots.end, SLOTS - 1);
        for pair in manager.nodes().windows(2) {
            assert_eq!(pair[1].slots.start, pair[0].slots.end + 1);
        }
    }
}

#[test]
fn routing_scenario_five_nodes() {
    // See DESIGN.md's open questions: the reference scenario claims both
    // keys land in [13107,16383], but `slot_of` on the first key actually
    // computes 12315, in [9830,13106]. This asserts what's actually true:
    // the first key's resolved range, and that both keys route consistently
    // with `node_by_slot`.
    let manager = SlotManager::init(nodes(5)).unwrap();

    let k1 = "/CIQBU2WZQKNSBLKTBKZQ6AXNKJDNSPH6KGP4SBHLX3IMKXJSN5MNFRQ";
    let k2 = "/CIQE6RUJ44XEPJ2KJECAQ4RTF4TTOSY6V5TY5VANVE43NTBAYHFWF5Y";

    let node1 = manager.node_by_key(k1).unwrap();
    assert_eq!((node1.slots.start, node1.slots.end), (9830, 13106));
    assert_eq!(node1.id, manager.node_by_slot(slot_of(k1)).unwrap().id);

    let node2 = manager.node_by_key(k2).unwrap();
    assert_eq!(node2.id, manager.node_by_slot(slot_of(k2)).unwrap().id);
}

#[test]
fn boundary_dispatch_scenario_seven_nodes() {
    let manager = SlotManager::init(nodes(7)).unwrap();

    let cases: &[(u16, (u16, u16))] = &[
        (0, (0, 2340)),
        (2339, (0, 2340)),
        (2341, (2341, 4680)),
        (4681, (4681, 7021)),
        (14042, (11703, 14042)),
        (14043, (14043, 16383)),
        (16383, (14043, 16383)),
    ];

    for &(slot, expected) in cases {
        let node = manager.node_by_slot(slot).unwrap();
        assert_eq!((node.slots.start, node.slots.end), expected, "slot={slot}");
    }
}

#[test]
fn restore_from_persisted_json() {
    let json = r#"[
        {"id":"A","slots":{"start":0,"end":5460}},
        {"id":"B","slots":{"start":5461,"end":10922}},
        {"id":"C","slots":{"start":10923,"end":16383}}
    ]"#;
    let nodes: Vec<Node> = serde_json::from_str(json).unwrap();
    let manager = SlotManager::restore(nodes).unwrap();
    assert_eq!(manager.node_by_slot(5461).unwrap().id, "B");
}

#[test]
fn restore_rejects_gap_between_ranges() {
    let json = r#"[
        {"id":"A","slots":{"start":0,"end":5000}},
        {"id":"B","slots":{"start":5500,"end":16383}}
    ]"#;
    let nodes: Vec<Node> = serde_json::from_str(json).unwrap();
    assert!(SlotManager::restore(nodes).is_err());
}

#[test]
fn restore_round_trips_init() {
    let initialized = SlotManager::init(nodes(5)).unwrap();
    let restored = SlotManager::restore(initialized.nodes().to_vec()).unwrap();
    assert_eq!(initialized, restored);
}

#[test]
fn node_by_key_delegates_to_node_by_slot() {
    let manager = SlotManager::init(nodes(5)).unwrap();
    for i in 0..1000 {
        let key = format!("probe-{i}");
        let by_key = manager.node_by_key(&key).unwrap();
        let by_slot = manager.node_by_slot(slot_of(&key)).unwrap();
        assert_eq!(by_key.id, by_slot.id);
    }
}
