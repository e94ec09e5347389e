use std::ops;


// A value plus a "changed since the last render" flag. The host polls `take_dirt` to decide
// whether to redraw.
#[derive(Clone, Debug)]
pub struct Dirty<T> {
    value: T,
    dirty: bool,
}

impl<T> Dirty<T> {
    pub fn new(value: T) -> Self { Self { value, dirty: true } }

    pub fn get_mut(&mut self) -> &mut T {
        self.dirty = true;
        &mut self.value
    }

    // Like `get_mut`, but the flag is only raised if `f` reports a change.
    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> (R, bool)) -> R {
        let (ret, changed) = f(&mut self.value);
        self.dirty |= changed;
        ret
    }

    pub fn replace(&mut self, value: T) -> T {
        self.dirty = true;
        std::mem::replace(&mut self.value, value)
    }

    pub fn take_dirt(&mut self) -> bool { std::mem::take(&mut self.dirty) }
}

impl<T> ops::Deref for Dirty<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target { &self.value }
}
// No `DerefMut`: every mutation goes through `get_mut` so that it cannot forget the flag.
