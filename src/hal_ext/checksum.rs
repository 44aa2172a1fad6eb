use num::PrimInt;

/// Checksum generator
///
/// In principle this is similar to [`core::hash::Hasher`] but allows to use output
/// different than u64.
pub trait ChecksumGen {
    /// Checksum type (e.g. [`u8`])
    type Output: PrimInt;

    /// Reset internal state to start generating checksum for new data
    fn reset(&mut self);

    /// Push data from slice to the generator
    ///
    /// Call [`Self::reset`] before any [`Self::push`] sequence followed by [`Self::get`].
    fn push(&mut self, data: &[u8]);

    /// Retrieve checksum of all data since last [`Self::reset`]
    fn get(&self) -> Self::Output;

    /// Push `data` and retrieve the final checksum
    fn decode(&mut self, data: &[u8]) -> Self::Output
    where
        Self: Sized
    {
        self.reset();
        self.push(data);
        self.get()
    }

    /// Check that `checksum` matches `data`
    fn verify(&mut self, data: &[u8], checksum: Self::Output) -> bool
    where
        Self: Sized
    {
        self.decode(data) == checksum
    }
}

/// Longitudinal XOR of all bytes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Xor8(u8);

impl Xor8 {
    pub const fn new() -> Self {
        Self(0)
    }

    /// One-shot checksum of `data`
    pub fn of(data: &[u8]) -> u8 {
        Self::new().decode(data)
    }
}

impl ChecksumGen for Xor8 {
    type Output = u8;

    fn reset(&mut self) {
        self.0 = 0;
    }

    fn push(&mut self, data: &[u8]) {
        self.0 = data.iter().fold(self.0, |acc, b| acc ^ b);
    }

    fn get(&self) -> Self::Output {
        self.0
    }
}
