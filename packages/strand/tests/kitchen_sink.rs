use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use strand::prelude::*;

// A coroutine that mixes every kind of step: a plain yield, an awaited delay
// carrying a value across it, a dependent computation, and a natural end.
#[tokio::test]
async fn drives_a_mixed_coroutine_to_completion() {
    let runtime = Runtime::new();
    let scope = CoroutineScope::new(runtime.clone());

    let inputs: Rc<RefCell<Vec<Option<i32>>>> = Rc::new(RefCell::new(Vec::new()));
    let seen = inputs.clone();
    let mut step = 0;
    scope.start_coroutine(from_fn(move |input: Option<i32>| {
        seen.borrow_mut().push(input);
        step += 1;
        match step {
            1 => Step::Yielded(Yield::value(1)),
            2 => {
                let carry = input.unwrap();
                Step::Yielded(Yield::until(async move {
                    wait(Duration::from_millis(5)).await;
                    carry
                }))
            }
            3 => Step::Yielded(Yield::value(input.unwrap() + 1)),
            _ => Step::Complete(input.unwrap()),
        }
    }));

    runtime.run_until_idle().await;

    assert_eq!(*inputs.borrow(), vec![None, Some(1), Some(1), Some(2)]);
    assert_eq!(scope.in_flight(), 0);
    assert!(runtime.is_idle());
}
