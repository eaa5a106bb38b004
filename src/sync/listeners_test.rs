use std::sync::{Arc, Mutex};

use super::*;

#[test]
fn notify_runs_in_subscription_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut listeners = Listeners::new();
    for tag in ["thumbnails", "outline"] {
        let order = Arc::clone(&order);
        listeners.subscribe(move || order.lock().unwrap().push(tag));
    }
    listeners.notify();
    assert_eq!(*order.lock().unwrap(), vec!["thumbnails", "outline"]);
}

#[test]
fn unsubscribe_stops_delivery() {
    let hits = Arc::new(Mutex::new(0));
    let mut listeners = Listeners::new();
    let counter = Arc::clone(&hits);
    let id = listeners.subscribe(move || *counter.lock().unwrap() += 1);

    listeners.notify();
    assert!(listeners.unsubscribe(id));
    assert!(!listeners.unsubscribe(id));
    listeners.notify();

    assert_eq!(*hits.lock().unwrap(), 1);
    assert!(listeners.is_empty());
}
