use std::ops::{Deref, DerefMut};

use log::debug;

use crate::env::Environment;

/// Closes the wrapped environment when dropped, including during unwinding
struct CloseGuard<'a, E: Environment>(&'a mut E);

impl<E: Environment> Deref for CloseGuard<'_, E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl<E: Environment> DerefMut for CloseGuard<'_, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0
    }
}

impl<E: Environment> Drop for CloseGuard<'_, E> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Play a single rendered episode of `env`
///
/// Actions are chosen by `policy`, or sampled with [`Environment::random_action`] when `policy` is `None`.
/// The episode ends when the environment reports done or after `max_t` steps, and the environment is
/// always closed on the way out, even if a step panics.
///
/// ### Example
/// ```ignore
/// // random actions
/// run(&mut env, None, 200);
///
/// // a trained agent acting greedily
/// run(&mut env, Some(&mut |s| agent.act(s, 0.0)), 200);
/// ```
pub fn run<E: Environment>(
    env: &mut E,
    mut policy: Option<&mut dyn FnMut(&E::State) -> E::Action>,
    max_t: usize,
) {
    let mut env = CloseGuard(env);

    let mut state = env.reset();
    env.render();

    for t in 0..max_t {
        let action = match policy.as_deref_mut() {
            Some(select) => select(&state),
            None => env.random_action(),
        };
        let (next_state, _reward, done, _info) = env.step(action);
        env.render();
        state = next_state;

        if done {
            debug!("Episode finished after {} steps", t + 1);
            break;
        }
    }
}
