//! Eight-switch input snapshot and the providers that fill it.
//!
//! Every tick the launcher samples its [`InputProvider`] exactly once. The
//! physical switches and an optional network source are OR-merged by
//! [`MergedInput`]; when there is no network source the merge sees
//! [`NoNetwork`], which never reports a press.

use core::ops::BitOr;

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    signal::Signal,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Button {
    A,
    B,
    C,
    D,
    VolUp,
    VolDown,
    BrightUp,
    BrightDown,
}

impl Button {
    pub const ALL: [Button; 8] = [
        Button::A,
        Button::B,
        Button::C,
        Button::D,
        Button::VolUp,
        Button::VolDown,
        Button::BrightUp,
        Button::BrightDown,
    ];

    /// Parse a network token (`A`, `VOL_UP`, `bright_down`, ...).
    /// Case is ignored and surrounding whitespace trimmed.
    pub fn from_token(token: &str) -> Option<Self> {
        let t = token.trim();
        const NAMES: [(&str, Button); 8] = [
            ("A", Button::A),
            ("B", Button::B),
            ("C", Button::C),
            ("D", Button::D),
            ("VOL_UP", Button::VolUp),
            ("VOL_DOWN", Button::VolDown),
            ("BRIGHT_UP", Button::BrightUp),
            ("BRIGHT_DOWN", Button::BrightDown),
        ];
        NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(t))
            .map(|&(_, b)| b)
    }
}

/// Level-sensitive state of all eight switches for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonOctet {
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub d: bool,
    pub vol_up: bool,
    pub vol_down: bool,
    pub bright_up: bool,
    pub bright_down: bool,
}

impl ButtonOctet {
    pub const NONE: Self = Self {
        a: false,
        b: false,
        c: false,
        d: false,
        vol_up: false,
        vol_down: false,
        bright_up: false,
        bright_down: false,
    };

    pub fn only(button: Button) -> Self {
        let mut o = Self::NONE;
        o.set(button, true);
        o
    }

    pub fn get(&self, button: Button) -> bool {
        match button {
            Button::A => self.a,
            Button::B => self.b,
            Button::C => self.c,
            Button::D => self.d,
            Button::VolUp => self.vol_up,
            Button::VolDown => self.vol_down,
            Button::BrightUp => self.bright_up,
            Button::BrightDown => self.bright_down,
        }
    }

    pub fn set(&mut self, button: Button, pressed: bool) {
        let slot = match button {
            Button::A => &mut self.a,
            Button::B => &mut self.b,
            Button::C => &mut self.c,
            Button::D => &mut self.d,
            Button::VolUp => &mut self.vol_up,
            Button::VolDown => &mut self.vol_down,
            Button::BrightUp => &mut self.bright_up,
            Button::BrightDown => &mut self.bright_down,
        };
        *slot = pressed;
    }

    pub fn any(&self) -> bool {
        Button::ALL.iter().any(|&b| self.get(b))
    }
}

impl BitOr for ButtonOctet {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            a: self.a | rhs.a,
            b: self.b | rhs.b,
            c: self.c | rhs.c,
            d: self.d | rhs.d,
            vol_up: self.vol_up | rhs.vol_up,
            vol_down: self.vol_down | rhs.vol_down,
            bright_up: self.bright_up | rhs.bright_up,
            bright_down: self.bright_down | rhs.bright_down,
        }
    }
}

/// Rising-edge detector over successive snapshots.
#[derive(Default)]
pub struct Edges {
    prev: ButtonOctet,
}

impl Edges {
    /// Buttons that are down now and were up on the previous call.
    pub fn rising(&mut self, now: ButtonOctet) -> ButtonOctet {
        let mut out = ButtonOctet::NONE;
        for b in Button::ALL {
            out.set(b, now.get(b) && !self.prev.get(b));
        }
        self.prev = now;
        out
    }

    pub fn held(&self) -> ButtonOctet {
        self.prev
    }
}

/// Anything that can produce one snapshot per tick.
pub trait InputProvider {
    fn sample(&mut self) -> ButtonOctet;
}

impl<T: InputProvider + ?Sized> InputProvider for &mut T {
    fn sample(&mut self) -> ButtonOctet {
        (**self).sample()
    }
}

/// Network half used when the build has no network input.
pub struct NoNetwork;

impl InputProvider for NoNetwork {
    fn sample(&mut self) -> ButtonOctet {
        ButtonOctet::NONE
    }
}

/// Physical switches OR-merged with a network source.
pub struct MergedInput<P, N> {
    physical: P,
    network: N,
}

impl<P: InputProvider> MergedInput<P, NoNetwork> {
    pub fn physical_only(physical: P) -> Self {
        Self::new(physical, NoNetwork)
    }
}

impl<P: InputProvider, N: InputProvider> MergedInput<P, N> {
    pub fn new(physical: P, network: N) -> Self {
        Self { physical, network }
    }
}

impl<P: InputProvider, N: InputProvider> InputProvider for MergedInput<P, N> {
    fn sample(&mut self) -> ButtonOctet {
        self.physical.sample() | self.network.sample()
    }
}

/// Last button named by a network datagram, held until sampled once.
///
/// The transport (socket, radio) lives outside the crate and calls
/// [`NetworkLatch::receive`]; the frame loop samples `&NETWORK` through
/// [`InputProvider`]. A new datagram replaces any unsampled one, so only
/// the named button is reported.
pub struct NetworkLatch {
    pending: Signal<CriticalSectionRawMutex, Button>,
}

impl Default for NetworkLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkLatch {
    pub const fn new() -> Self {
        Self {
            pending: Signal::new(),
        }
    }

    pub fn post(&self, button: Button) {
        self.pending.signal(button);
    }

    /// Decode a text datagram and latch it. Unknown payloads are ignored.
    pub fn receive(&self, datagram: &[u8]) -> Option<Button> {
        let button = core::str::from_utf8(datagram)
            .ok()
            .and_then(Button::from_token)?;
        debug!("network button {:?}", button);
        self.post(button);
        Some(button)
    }
}

impl InputProvider for &NetworkLatch {
    fn sample(&mut self) -> ButtonOctet {
        self.pending
            .try_take()
            .map_or(ButtonOctet::NONE, ButtonOctet::only)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Replays a fixed script of snapshots, then reports nothing.
    pub struct Scripted<'a> {
        pub frames: &'a [ButtonOctet],
        pub at: usize,
    }

    impl InputProvider for Scripted<'_> {
        fn sample(&mut self) -> ButtonOctet {
            let o = self.frames.get(self.at).copied().unwrap_or_default();
            self.at += 1;
            o
        }
    }

    #[test]
    fn tokens_parse_loosely() {
        assert_eq!(Button::from_token(" vol_up\n"), Some(Button::VolUp));
        assert_eq!(Button::from_token("Bright_Down"), Some(Button::BrightDown));
        assert_eq!(Button::from_token("a"), Some(Button::A));
        assert_eq!(Button::from_token("START"), None);
    }

    #[test]
    fn merge_is_logical_or() {
        let phys = [ButtonOctet { a: true, ..ButtonOctet::NONE }];
        let net = [ButtonOctet { c: true, ..ButtonOctet::NONE }];
        let mut m = MergedInput::new(
            Scripted { frames: &phys, at: 0 },
            Scripted { frames: &net, at: 0 },
        );
        let o = m.sample();
        assert!(o.a && o.c && !o.b);
    }

    #[test]
    fn no_network_reports_nothing() {
        let phys = [ButtonOctet::only(Button::D)];
        let mut m = MergedInput::physical_only(Scripted { frames: &phys, at: 0 });
        assert_eq!(m.sample(), ButtonOctet::only(Button::D));
        assert_eq!(m.sample(), ButtonOctet::NONE);
    }

    #[test]
    fn edges_fire_once_per_press() {
        let mut e = Edges::default();
        let a = ButtonOctet::only(Button::A);
        assert!(e.rising(a).a);
        assert!(!e.rising(a).a);
        assert!(!e.rising(ButtonOctet::NONE).a);
        assert!(e.rising(a).a);
    }

    #[test]
    fn latch_holds_for_one_sample() {
        let latch = NetworkLatch::new();
        assert_eq!(latch.receive(b"B"), Some(Button::B));
        assert_eq!(latch.receive(b"C"), Some(Button::C));
        assert_eq!(latch.receive(b"nonsense"), None);
        let mut src = &latch;
        assert_eq!(src.sample(), ButtonOctet::only(Button::C));
        assert_eq!(src.sample(), ButtonOctet::NONE);
    }
}
