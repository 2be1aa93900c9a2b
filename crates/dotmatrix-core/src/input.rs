/// Button states sampled once per frame by the frontend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,
    pub b: bool,
    pub start: bool,
    pub select: bool,
}

impl Buttons {
    /// Right, Left, Up, Down in bits 0-3, set when pressed.
    fn direction_bits(&self) -> u8 {
        (self.right as u8) | (self.left as u8) << 1 | (self.up as u8) << 2 | (self.down as u8) << 3
    }

    /// A, B, Select, Start in bits 0-3, set when pressed.
    fn action_bits(&self) -> u8 {
        (self.a as u8) | (self.b as u8) << 1 | (self.select as u8) << 2 | (self.start as u8) << 3
    }
}

/// P1/JOYP register.
///
/// See: https://gbdev.io/pandocs/Joypad_Input.html
#[derive(Debug, Default)]
pub struct Joypad {
    /// Bits 4 (directions) and 5 (actions), active low.
    select: u8,
    buttons: Buttons,
}

impl Joypad {
    pub fn new() -> Self {
        Self {
            select: 0x30,
            buttons: Buttons::default(),
        }
    }

    fn lines(&self) -> u8 {
        let mut low = 0x0F;
        if self.select & 0x10 == 0 {
            low &= !self.buttons.direction_bits();
        }
        if self.select & 0x20 == 0 {
            low &= !self.buttons.action_bits();
        }
        low & 0x0F
    }

    pub fn read(&self) -> u8 {
        0xC0 | self.select | self.lines()
    }

    /// Returns true when a selected input line fell, which requests the
    /// joypad interrupt.
    pub fn write(&mut self, val: u8) -> bool {
        let before = self.lines();
        self.select = val & 0x30;
        before & !self.lines() != 0
    }

    /// Swap in a new button snapshot. Same return contract as [`Joypad::write`].
    pub fn update(&mut self, buttons: Buttons) -> bool {
        let before = self.lines();
        self.buttons = buttons;
        before & !self.lines() != 0
    }

    pub fn buttons(&self) -> Buttons {
        self.buttons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unselected_groups_read_high() {
        let mut pad = Joypad::new();
        pad.update(Buttons {
            a: true,
            ..Buttons::default()
        });
        assert_eq!(pad.read(), 0xFF);
        pad.write(0x10);
        assert_eq!(pad.read() & 0x0F, 0x0E);
        pad.write(0x20);
        assert_eq!(pad.read() & 0x0F, 0x0F);
    }

    #[test]
    fn press_in_selected_group_requests_interrupt() {
        let mut pad = Joypad::new();
        pad.write(0x20);
        let fired = pad.update(Buttons {
            down: true,
            ..Buttons::default()
        });
        assert!(fired);
        assert_eq!(pad.read() & 0x0F, 0x07);
        // Holding the button is not a new edge.
        assert!(!pad.update(pad.buttons()));
    }
}
