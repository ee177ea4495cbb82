use std::collections::VecDeque;

/// A run of fence characters read back from the end of a [`KeyBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceRun {
    pub len: usize,
    /// The scan hit the oldest buffered key, so the run or the word after
    /// it may have started before the buffer does.
    pub at_start: bool,
}

/// Rolling window over the most recently typed characters.
///
/// Oldest characters fall off once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct KeyBuffer {
    keys: VecDeque<char>,
    capacity: usize,
}

impl KeyBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            keys: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, c: char) {
        if self.keys.len() == self.capacity {
            self.keys.pop_front();
        }
        self.keys.push_back(c);
        log::trace!("Key buffer: {:?}", self.as_string());
    }

    /// Drop the most recent character, as Backspace does.
    pub fn pop(&mut self) -> Option<char> {
        self.keys.pop_back()
    }

    pub fn clear(&mut self) {
        if !self.keys.is_empty() {
            log::trace!("Key buffer cleared");
        }
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Count the run of `fence` typed before an optional trailing word,
    /// such as a code language, and the spaces ahead of it.
    pub fn fence_run(&self, fence: char) -> FenceRun {
        let mut keys = self.keys.iter().rev().peekable();
        while keys.next_if(|&&k| k != fence && !k.is_whitespace()).is_some() {}
        while keys.next_if(|&&k| k == ' ' || k == '\t').is_some() {}
        let mut len = 0;
        while keys.next_if(|&&k| k == fence).is_some() {
            len += 1;
        }
        FenceRun {
            len,
            at_start: keys.peek().is_none(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.keys.len() == self.capacity
    }

    pub fn as_string(&self) -> String {
        self.keys.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn drops_oldest_when_full() {
        let mut buffer = KeyBuffer::new(3);
        for c in "abcd".chars() {
            buffer.push(c);
        }
        assert_eq!(buffer.as_string(), "bcd");
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn backspace_shortens_the_run() {
        let mut buffer = KeyBuffer::new(8);
        for c in "x```".chars() {
            buffer.push(c);
        }
        assert_eq!(buffer.fence_run('`').len, 3);
        assert_eq!(buffer.fence_run('~').len, 0);
        buffer.pop();
        assert_eq!(buffer.fence_run('`').len, 2);
    }

    #[rstest]
    #[case("```", 3, true)]
    #[case("x```", 3, false)]
    #[case("```js", 3, true)]
    #[case("``` rust", 3, true)]
    #[case("a ~~~", 0, false)]
    #[case("", 0, true)]
    fn reads_fence_runs(#[case] typed: &str, #[case] len: usize, #[case] at_start: bool) {
        let mut buffer = KeyBuffer::new(16);
        for c in typed.chars() {
            buffer.push(c);
        }
        assert_eq!(buffer.fence_run('`'), FenceRun { len, at_start });
    }

    #[test]
    fn zero_capacity_still_holds_one_key() {
        let mut buffer = KeyBuffer::new(0);
        buffer.push('a');
        buffer.push('b');
        assert_eq!(buffer.as_string(), "b");
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
