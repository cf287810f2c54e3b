use super::*;
use crate::control::ControlKind;
use crate::TestRuntime;
use serde_json::json;

fn field(value: &str) -> ControlRef {
    ControlRef::field(json!(value), Vec::new())
}

#[test]
fn add_before_initialize_fails_fast() {
    let runtime = TestRuntime::new();
    let coordinator = AttachmentCoordinator::new(runtime.handle());

    assert!(matches!(
        coordinator.add_control("name", field("x")),
        Err(LazyFormError::NotInitialized)
    ));
    assert!(matches!(
        coordinator.remove_control("name", &field("x")),
        Err(LazyFormError::NotInitialized)
    ));
    assert!(!coordinator.is_initialized());
}

#[test]
fn ordered_container_appends_and_removes_by_identity() {
    let runtime = TestRuntime::new();
    let coordinator = AttachmentCoordinator::new(runtime.handle());
    let array = ControlRef::array(Vec::new());
    coordinator.initialize(&array).expect("array is a container");

    let (c1, c2, c3) = (field("c1"), field("c2"), field("c3"));
    for control in [&c1, &c2, &c3] {
        coordinator
            .add_control("item", control.clone())
            .expect("add");
    }
    let ordered = array.as_ordered().expect("ordered view");
    assert_eq!(ordered.controls(), vec![c1.clone(), c2.clone(), c3.clone()]);

    coordinator.remove_control("item", &c2).expect("remove");
    assert_eq!(ordered.controls(), vec![c1, c3]);
}

#[test]
fn named_container_overwrites_same_key() {
    let runtime = TestRuntime::new();
    let coordinator = AttachmentCoordinator::new(runtime.handle());
    let group = ControlRef::group(Vec::new());
    coordinator.initialize(&group).expect("group is a container");

    let (a, b) = (field("cA"), field("cB"));
    coordinator.add_control("street", a).expect("add");
    coordinator.add_control("street", b.clone()).expect("add");

    let named = group.as_named().expect("named view");
    assert_eq!(named.len(), 1);
    assert_eq!(named.get("street"), Some(b));
}

#[test]
fn reinitialize_replaces_adapter_and_resets_once_per_call() {
    let runtime = TestRuntime::new();
    let coordinator = AttachmentCoordinator::new(runtime.handle());
    let resets = Rc::new(Cell::new(0));
    let _subscription = {
        let resets = resets.clone();
        coordinator
            .reset_channel()
            .subscribe(move |_| resets.set(resets.get() + 1))
    };

    let array = ControlRef::array(Vec::new());
    coordinator.initialize(&array).expect("array");
    assert_eq!(resets.get(), 1);

    let group = ControlRef::group(Vec::new());
    coordinator.initialize(&group).expect("group");
    assert_eq!(resets.get(), 2);
    assert_eq!(coordinator.generation(), 2);

    let control = field("x");
    coordinator.add_control("name", control.clone()).expect("add");
    assert!(array.as_ordered().expect("ordered view").is_empty());
    assert_eq!(group.as_named().expect("named view").get("name"), Some(control));
}

#[test]
fn unsupported_container_keeps_previous_binding() {
    let runtime = TestRuntime::new();
    let coordinator = AttachmentCoordinator::new(runtime.handle());
    let resets = Rc::new(Cell::new(0));
    let _subscription = {
        let resets = resets.clone();
        coordinator
            .reset_channel()
            .subscribe(move |_| resets.set(resets.get() + 1))
    };
    let group = ControlRef::group(Vec::new());
    coordinator.initialize(&group).expect("group");

    let result = coordinator.initialize(&field("leaf"));

    assert!(matches!(
        result,
        Err(LazyFormError::UnsupportedContainerKind {
            kind: ControlKind::Field
        })
    ));
    assert_eq!(resets.get(), 1);
    assert_eq!(coordinator.container(), Some(group));
}

#[test]
fn events_report_effective_changes_only() {
    let runtime = TestRuntime::new();
    let coordinator = AttachmentCoordinator::new(runtime.handle());
    let log: Rc<RefCell<Vec<AttachmentEvent>>> = Rc::new(RefCell::new(Vec::new()));
    let _subscription = {
        let log = log.clone();
        coordinator
            .events()
            .subscribe(move |event| log.borrow_mut().push(event.clone()))
    };
    coordinator
        .initialize(&ControlRef::array(Vec::new()))
        .expect("array");

    let control = field("x");
    coordinator.add_control("item", control.clone()).expect("add");
    coordinator.remove_control("item", &control).expect("remove");
    coordinator.remove_control("item", &control).expect("second remove is tolerated");

    assert_eq!(
        log.borrow().as_slice(),
        &[
            AttachmentEvent::Added {
                key: "item".into(),
                control: control.clone()
            },
            AttachmentEvent::Removed {
                key: "item".into(),
                control
            },
        ]
    );
}
