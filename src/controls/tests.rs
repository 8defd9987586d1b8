//! Tests for the controls engine

use super::*;
use crate::input::{normalize, RawInput};
use crate::registry::{ActionSpec, ActionRegistry};
use parking_lot::Mutex;
use proptest::prelude::*;

type Call = (String, u32, i32, bool);
type Calls = Arc<Mutex<Vec<Call>>>;

fn recording_registry() -> (Arc<ActionRegistry>, Calls) {
    let calls: Calls = Arc::default();
    let registry = ActionRegistry::standard(|spec| {
        let calls = calls.clone();
        let name = spec.name.clone();
        Arc::new(move |target, value, is_delta| {
            calls.lock().push((name.clone(), target, value, is_delta));
            Ok(())
        })
    });
    (Arc::new(registry), calls)
}

fn make_controls(lines: &[&str]) -> (Controls, Calls) {
    let (registry, calls) = recording_registry();
    let bindings = lines
        .iter()
        .map(|line| Binding::parse(line, &registry).unwrap())
        .collect();
    (Controls::with_bindings(registry, bindings), calls)
}

fn key(s: &str) -> InputKey {
    s.parse().unwrap()
}

fn call(method: &str, target: u32, value: i32, is_delta: bool) -> Call {
    (method.to_string(), target, value, is_delta)
}

fn ms(start: Instant, millis: u64) -> Instant {
    start + Duration::from_millis(millis)
}

#[test]
fn test_direct_inverted_polarity() {
    let (mut controls, calls) = make_controls(&["c0.7:dp_vol.0.-127"]);

    controls.input(&key("c0.7"), 0).unwrap();
    controls.input(&key("c0.7"), 127).unwrap();
    controls.input(&key("c0.7"), 0x30).unwrap();

    assert_eq!(
        *calls.lock(),
        vec![
            call("p_vol", 0, 127, false),
            call("p_vol", 0, 0, false),
            call("p_vol", 0, 127 - 0x30, false),
        ]
    );
}

#[test]
fn test_out_of_range_value_is_clamped() {
    let (mut controls, calls) = make_controls(&["c0.7:dp_vol.0.-127", "c0.7:dp_vol.1.127"]);

    controls.input(&key("c0.7"), 200).unwrap();
    controls.input(&key("c0.7"), 0xff).unwrap();

    assert_eq!(
        *calls.lock(),
        vec![
            call("p_vol", 0, 0, false),
            call("p_vol", 1, 127, false),
            call("p_vol", 0, 0, false),
            call("p_vol", 1, 127, false),
        ]
    );
}

#[test]
fn test_direct_passes_every_value() {
    let (mut controls, calls) = make_controls(&["c0.7:dp_vol.2.127"]);

    for v in [0, 1, 63, 64, 127] {
        controls.input(&key("c0.7"), v).unwrap();
    }

    let values: Vec<i32> = calls.lock().iter().map(|c| c.2).collect();
    assert_eq!(values, vec![0, 1, 63, 64, 127]);
}

#[test]
fn test_pulse_suppresses_held_repeats() {
    let (mut controls, calls) = make_controls(&["k0.61:pp_stop.0.127"]);
    let start = Instant::now();

    controls.input_at(&key("k0.61"), 127, start).unwrap();
    controls.input_at(&key("k0.61"), 127, ms(start, 30)).unwrap();
    controls.input_at(&key("k0.61"), 127, ms(start, 60)).unwrap();

    assert_eq!(*calls.lock(), vec![call("p_stop", 0, 127, true)]);
}

#[test]
fn test_pulse_fires_again_after_release() {
    let (mut controls, calls) = make_controls(&["k0.61:pp_stop.0.127"]);
    let start = Instant::now();

    controls.input_at(&key("k0.61"), 127, start).unwrap();
    // Release does not fire a press-triggered pulse
    let released = controls.input_at(&key("k0.61"), 0, ms(start, 10)).unwrap();
    assert_eq!(released, Dispatch::Handled { invoked: 0 });
    controls.input_at(&key("k0.61"), 127, ms(start, 20)).unwrap();

    assert_eq!(calls.lock().len(), 2);
}

#[test]
fn test_pulse_fires_again_after_expiry() {
    let (mut controls, calls) = make_controls(&["k0.61:pp_stop.0.127"]);
    let start = Instant::now();

    controls.input_at(&key("k0.61"), 127, start).unwrap();
    // No release seen, but the entry lapsed
    controls.input_at(&key("k0.61"), 127, ms(start, 900)).unwrap();

    assert_eq!(calls.lock().len(), 2);
}

#[test]
fn test_pulse_act_on_release() {
    let (mut controls, calls) = make_controls(&["k0.61:pp_stop.1.0"]);
    let start = Instant::now();

    let pressed = controls.input_at(&key("k0.61"), 127, start).unwrap();
    assert_eq!(pressed, Dispatch::Handled { invoked: 0 });
    assert!(calls.lock().is_empty());

    controls.input_at(&key("k0.61"), 0, ms(start, 100)).unwrap();
    assert_eq!(*calls.lock(), vec![call("p_stop", 1, 0, true)]);
}

#[test]
fn test_pulse_gate_checks_raw_value_before_inversion() {
    // Act-on-release: the repeat gate only filters raw highs, so every low
    // fires, even two in a row with no press between them.
    let (mut controls, calls) = make_controls(&["k0.61:pp_stop.0.64"]);
    let start = Instant::now();

    controls.input_at(&key("k0.61"), 127, start).unwrap();
    controls.input_at(&key("k0.61"), 127, ms(start, 10)).unwrap();
    controls.input_at(&key("k0.61"), 0, ms(start, 20)).unwrap();
    controls.input_at(&key("k0.61"), 0, ms(start, 30)).unwrap();

    assert_eq!(
        *calls.lock(),
        vec![call("p_stop", 0, 64, true), call("p_stop", 0, 64, true)]
    );
}

#[test]
fn test_set_threshold() {
    let (mut controls, calls) = make_controls(&["c0.10:sx_fade.0.100"]);

    controls.input(&key("c0.10"), 0x3f).unwrap();
    assert!(calls.lock().is_empty());

    controls.input(&key("c0.10"), 0x40).unwrap();
    controls.input(&key("c0.10"), 0x40).unwrap();
    assert_eq!(
        *calls.lock(),
        vec![call("x_fade", 0, 100, false), call("x_fade", 0, 100, false)]
    );
}

#[test]
fn test_alter_sends_delta() {
    let (mut controls, calls) = make_controls(&["c0.11:ap_vol.1.-5"]);

    controls.input(&key("c0.11"), 0x7f).unwrap();
    controls.input(&key("c0.11"), 0).unwrap();
    controls.input(&key("c0.11"), 0x41).unwrap();

    assert_eq!(
        *calls.lock(),
        vec![call("p_vol", 1, -5, true), call("p_vol", 1, -5, true)]
    );
}

#[test]
fn test_fan_out_in_list_order() {
    let (mut controls, calls) = make_controls(&[
        "n0.3c:pp_pp.0.127",
        "c0.7:dp_vol.0.127",
        "n0.3c:pp_stop.1.127",
        "n0.3c:sx_fade.0.0",
    ]);

    let outcome = controls.input(&key("n0.3c"), 127).unwrap();

    assert_eq!(outcome, Dispatch::Handled { invoked: 3 });
    assert_eq!(
        *calls.lock(),
        vec![
            call("p_pp", 0, 127, true),
            call("p_stop", 1, 127, true),
            call("x_fade", 0, 0, false),
        ]
    );
}

#[test]
fn test_unbound_input_is_ignored() {
    let (mut controls, calls) = make_controls(&["c0.7:dp_vol.0.127"]);

    let outcome = controls.input(&key("c1.7"), 127).unwrap();

    assert_eq!(outcome, Dispatch::Handled { invoked: 0 });
    assert!(calls.lock().is_empty());
}

#[test]
fn test_failing_action_stops_the_event() {
    let calls: Calls = Arc::default();
    let mut builder = ActionRegistry::builder();
    for name in ["t_first", "t_broken", "t_last"] {
        let calls = calls.clone();
        let handler: crate::registry::ActionFn = Arc::new(move |target, value, is_delta| {
            if name == "t_broken" {
                anyhow::bail!("device unplugged");
            }
            calls.lock().push((name.to_string(), target, value, is_delta));
            Ok(())
        });
        builder
            .register(ActionSpec::new(name, &[Mode::Set], ""), handler)
            .unwrap();
    }
    let registry = Arc::new(builder.build());
    let bindings: Vec<Binding> = ["c0.1:st_first.0.1", "c0.1:st_broken.0.2", "c0.1:st_last.0.3"]
        .iter()
        .map(|s| Binding::parse(s, &registry).unwrap())
        .collect();
    let mut controls = Controls::with_bindings(registry, bindings.clone());

    let err = controls.input(&key("c0.1"), 127).unwrap_err();

    assert!(format!("{:#}", err).contains("device unplugged"));
    assert_eq!(*calls.lock(), vec![call("t_first", 0, 1, false)]);
    assert!(controls.is_highlighted(&bindings[0]));
    assert!(controls.is_highlighted(&bindings[1]));
    assert!(!controls.is_highlighted(&bindings[2]));
}

#[test]
fn test_keyboard_fire_end_to_end() {
    let (mut controls, calls) = make_controls(&["k100.ffbe:pk_fire.0.127"]);
    let press = RawInput::Key {
        state: 0x100,
        keyval: 0xffbe,
        pressed: true,
    };
    let release = RawInput::Key {
        state: 0x100,
        keyval: 0xffbe,
        pressed: false,
    };

    // Press plus two auto-repeats, release, press again
    for raw in [press, press, press, release, press] {
        let input = normalize(&raw).unwrap();
        controls.input_normalized(input).unwrap();
    }

    assert_eq!(
        *calls.lock(),
        vec![call("k_fire", 0, 127, true), call("k_fire", 0, 127, true)]
    );
}

#[test]
fn test_learner_intercepts_input() {
    let (mut controls, calls) = make_controls(&["c0.7:dp_vol.0.127"]);
    let learned: Arc<Mutex<Vec<InputKey>>> = Arc::default();
    let sink = learned.clone();
    controls.set_learner(Box::new(move |key: &InputKey| sink.lock().push(*key)));

    assert_eq!(controls.input(&key("c0.7"), 100).unwrap(), Dispatch::Learned);
    assert_eq!(controls.input(&key("n0.1"), 127).unwrap(), Dispatch::Learned);
    assert!(calls.lock().is_empty());
    assert_eq!(*learned.lock(), vec![key("c0.7"), key("n0.1")]);

    controls.clear_learner();
    assert!(!controls.is_learning());
    controls.input(&key("c0.7"), 100).unwrap();
    assert_eq!(*calls.lock(), vec![call("p_vol", 0, 100, false)]);
}

#[test]
fn test_invoked_bindings_are_highlighted() {
    let (mut controls, _calls) = make_controls(&["c0.10:sx_fade.0.100", "c0.10:sx_fade.1.100"]);
    controls.set_highlight_ticks(1);
    let bindings = controls.bindings().to_vec();

    controls.input(&key("c0.10"), 0).unwrap();
    assert!(!controls.is_highlighted(&bindings[0]));

    controls.input(&key("c0.10"), 127).unwrap();
    assert!(controls.is_highlighted(&bindings[0]));
    assert!(controls.is_highlighted(&bindings[1]));

    assert_eq!(controls.tick_highlights().len(), 2);
    assert_eq!(controls.tick_highlights().len(), 2);
    assert!(!controls.is_highlighted(&bindings[0]));
}

#[test]
fn test_mutations_rebuild_table() {
    let (mut controls, calls) = make_controls(&["c0.7:dp_vol.0.127"]);
    let fire = controls.parse("n0.24:pk_fire.3.127").unwrap();

    controls.push(fire.clone());
    assert_eq!(controls.bindings_for(&key("n0.24")), &[fire.clone()]);

    let replaced = controls
        .replace(1, fire.clone().with_target(4))
        .unwrap();
    assert_eq!(replaced, fire);
    controls.input(&key("n0.24"), 127).unwrap();
    assert_eq!(*calls.lock(), vec![call("k_fire", 4, 127, true)]);

    controls.insert(0, fire.clone());
    assert_eq!(controls.bindings_for(&key("n0.24")).len(), 2);
    assert_eq!(controls.bindings_for(&key("n0.24"))[0], fire);

    assert_eq!(controls.remove(0), Some(fire));
    assert_eq!(controls.remove(9), None);
    assert_eq!(controls.bindings().len(), 2);
    assert_eq!(controls.table().len(), 2);
}

#[test]
fn test_shared_controls_across_threads() {
    let (controls, calls) = make_controls(&["c0.7:dp_vol.0.127"]);
    let shared = SharedControls::new(controls);

    let handles: Vec<_> = (0..4u8)
        .map(|i| {
            let shared = shared.clone();
            std::thread::spawn(move || shared.input(&"c0.7".parse().unwrap(), i).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(calls.lock().len(), 4);
    assert_eq!(shared.bindings().len(), 1);
}

const POOL: [&str; 6] = [
    "c0.7:dp_vol.0.127",
    "c0.7:dp_vol.1.-127",
    "k0.61:pp_stop.0.127",
    "n1.3c:pk_fire.2.127",
    "k0.61:sx_fade.0.64",
    "p3.0:dp_pitch.0.127",
];

proptest! {
    #[test]
    fn prop_table_matches_list(ops in prop::collection::vec((0u8..5, 0usize..8, 0usize..POOL.len()), 0..40)) {
        let (registry, _calls) = recording_registry();
        let pool: Vec<Binding> = POOL
            .iter()
            .map(|s| Binding::parse(s, &registry).unwrap())
            .collect();
        let mut controls = Controls::new(registry);

        for (op, index, pick) in ops {
            let binding = pool[pick].clone();
            match op {
                0 => controls.push(binding),
                1 => controls.insert(index, binding),
                2 => {
                    controls.remove(index);
                }
                3 => {
                    controls.replace(index, binding);
                }
                _ => controls.set_bindings(pool[..pick].to_vec()),
            }

            let list = controls.bindings();
            for candidate in &pool {
                let k = candidate.input_key();
                let expected: Vec<Binding> =
                    list.iter().filter(|b| b.input_key() == k).cloned().collect();
                prop_assert_eq!(controls.bindings_for(&k), expected.as_slice());
            }
            let mut keys: Vec<InputKey> = list.iter().map(Binding::input_key).collect();
            keys.sort_by_key(|k| k.to_string());
            keys.dedup();
            prop_assert_eq!(controls.table().len(), keys.len());
        }
    }
}
