use catalyst_layout::{Graph, LayoutSession, Link, Node, SessionOptions};

fn dist(a: catalyst_layout::Point, b: catalyst_layout::Point) -> f64 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn chain_session() -> LayoutSession {
    let graph = Graph {
        nodes: vec![Node::new("a"), Node::new("b"), Node::new("c")],
        links: vec![Link::new("a", "b"), Link::new("b", "c")],
    };
    LayoutSession::new(&graph, 800.0, 600.0, SessionOptions::default()).expect("session")
}

#[test]
fn chain_converges_near_the_configured_separation() {
    let mut s = chain_session();
    s.run();
    assert!(s.converged());

    let a = s.position("a").expect("a");
    let b = s.position("b").expect("b");
    let c = s.position("c").expect("c");

    let ab = dist(a, b);
    let bc = dist(b, c);
    assert!(
        (100.0..=140.0).contains(&ab),
        "distance(a,b) = {ab}, expected near 120"
    );
    assert!(
        (100.0..=140.0).contains(&bc),
        "distance(b,c) = {bc}, expected near 120"
    );
    assert!(dist(a, c) > 1.0, "chain endpoints should not be coincident");
}

#[test]
fn convergence_happens_within_the_cooling_budget() {
    let mut s = chain_session();
    let mut ticks = 0u64;
    while !s.converged() && ticks < 400 {
        s.step();
        ticks += 1;
    }
    assert!(s.converged(), "did not converge within 400 ticks");
    assert!(s.alpha() < 0.001, "alpha {} did not cool", s.alpha());
    assert!(
        s.last_tick_max_displacement() < 1.0,
        "residual per-tick displacement {} too large",
        s.last_tick_max_displacement()
    );
}

#[test]
fn disconnected_nodes_spread_apart() {
    let graph = Graph {
        nodes: vec![Node::new("a"), Node::new("b"), Node::new("c"), Node::new("d")],
        links: Vec::new(),
    };
    let mut s = LayoutSession::new(&graph, 800.0, 600.0, SessionOptions::default()).expect("session");
    s.run();
    let positions: Vec<_> = s.positions().into_values().collect();
    for i in 0..positions.len() {
        for j in (i + 1)..positions.len() {
            assert!(
                dist(positions[i], positions[j]) >= 90.0,
                "unlinked entities should repel beyond their collision radii"
            );
        }
    }
}

#[test]
fn unknown_endpoint_is_excluded_but_session_survives() {
    let graph = Graph {
        nodes: vec![Node::new("a"), Node::new("b")],
        links: vec![Link::new("a", "b"), Link::new("x", "a")],
    };
    let mut s = LayoutSession::new(&graph, 800.0, 600.0, SessionOptions::default()).expect("session");
    assert_eq!(s.active_link_count(), 1);
    assert_eq!(s.dropped_links().len(), 1);
    s.run();
    assert!(s.converged());
}

#[test]
fn pin_holds_then_unpin_releases() {
    let mut s = chain_session();
    s.pin("a", 400.0, 300.0);
    for _ in 0..5 {
        s.step();
        let p = s.position("a").expect("a");
        assert_eq!((p.x, p.y), (400.0, 300.0));
    }
    s.unpin("a");
    s.step();
    let p = s.position("a").expect("a");
    assert_ne!(
        (p.x, p.y),
        (400.0, 300.0),
        "released entity should rejoin free simulation"
    );
}

#[test]
fn identical_inputs_and_events_replay_bit_identically() {
    let run = || {
        let mut s = chain_session();
        for t in 0..120 {
            if t == 10 {
                s.pin("b", 500.0, 100.0);
            }
            if t == 40 {
                s.pin("b", 480.0, 140.0);
            }
            if t == 60 {
                s.unpin("b");
            }
            s.step();
        }
        s.positions()
    };
    let first = run();
    let second = run();
    assert_eq!(first, second);
}

#[test]
fn seeds_are_honored_for_degenerate_starts() {
    // Two entities forced onto the same start position only separate via the
    // seeded jiggle, so different seeds may diverge while equal seeds agree.
    let graph = Graph {
        nodes: vec![
            Node {
                x: Some(400.0),
                y: Some(300.0),
                ..Node::new("a")
            },
            Node {
                x: Some(400.0),
                y: Some(300.0),
                ..Node::new("b")
            },
        ],
        links: Vec::new(),
    };
    let run = |seed: u64| {
        let opts = SessionOptions {
            random_seed: seed,
            ..SessionOptions::default()
        };
        let mut s = LayoutSession::new(&graph, 800.0, 600.0, opts).expect("session");
        s.run();
        s.positions()
    };
    assert_eq!(run(7), run(7));
    let spread = run(7);
    let a = spread.get("a").copied().expect("a");
    let b = spread.get("b").copied().expect("b");
    assert!(dist(a, b) > 90.0, "coincident entities must separate");
}

#[test]
fn one_shot_layout_matches_a_manually_run_session() {
    let graph = Graph {
        nodes: vec![Node::new("a"), Node::new("b")],
        links: vec![Link::new("a", "b")],
    };
    let opts = SessionOptions::default();
    let result = catalyst_layout::layout(&graph, 800.0, 600.0, &opts).expect("layout");

    let mut session = LayoutSession::new(&graph, 800.0, 600.0, opts).expect("session");
    session.run();

    assert_eq!(result.positions, session.positions());
    assert_eq!(result.ticks, session.ticks());
    assert!(result.ticks <= LayoutSession::MAX_TICKS);
}
