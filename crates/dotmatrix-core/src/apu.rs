//! Sound generator.
//!
//! The channel registers live in the MMU's I/O block; the APU reads them
//! through [`IoBus`] whenever a channel is triggered or clocked, and clears
//! the NR52 status bits when a channel shuts itself off. Mixing is
//! approximate: samples are produced by nearest-cycle decimation.

use crate::{
    bus::IoBus,
    mmu::{NR10, NR51, NR52, WAVE_RAM},
};

const CPU_CLOCK_HZ: u64 = 4_194_304;
// 512 Hz frame sequencer tick
const FRAME_SEQUENCER_PERIOD: u32 = 8192;

const NR50: u16 = 0xFF24;

// Duty table for pulse channels. Index corresponds to NRx1 bits 6-7:
// 12.5%, 25%, 50%, 75%.
const DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 0, 0, 1, 1, 1],
    [0, 1, 1, 1, 1, 1, 1, 0],
];

const NOISE_DIVISORS: [u32; 8] = [8, 16, 32, 48, 64, 80, 96, 112];

/// First register (NRx0) of each channel.
const CHANNEL_BASE: [u16; 4] = [NR10, 0xFF15, 0xFF1A, 0xFF1F];

fn reg(bus: &dyn IoBus, channel: usize, offset: u16) -> u8 {
    bus.io(CHANNEL_BASE[channel] + offset)
}

fn frequency(bus: &dyn IoBus, channel: usize) -> u16 {
    let lo = reg(bus, channel, 3) as u16;
    let hi = (reg(bus, channel, 4) & 0x07) as u16;
    hi << 8 | lo
}

#[derive(Default, Clone, Copy)]
struct Envelope {
    volume: u8,
    period: u8,
    add: bool,
    timer: u8,
}

impl Envelope {
    fn reload(&mut self, nrx2: u8) {
        self.volume = nrx2 >> 4;
        self.add = nrx2 & 0x08 != 0;
        self.period = nrx2 & 0x07;
        self.timer = self.period;
    }

    fn clock(&mut self) {
        if self.period == 0 {
            return;
        }
        self.timer = self.timer.saturating_sub(1);
        if self.timer > 0 {
            return;
        }
        self.timer = self.period;
        if self.add && self.volume < 15 {
            self.volume += 1;
        } else if !self.add && self.volume > 0 {
            self.volume -= 1;
        }
    }
}

#[derive(Default, Clone, Copy)]
struct Sweep {
    enabled: bool,
    shadow: u16,
    timer: u8,
}

#[derive(Default, Clone, Copy)]
struct Channel {
    enabled: bool,
    length: u16,
    timer: i32,
    /// Duty step, wave sample index or unused for noise.
    position: u8,
    envelope: Envelope,
    lfsr: u16,
}

pub struct Apu {
    channels: [Channel; 4],
    sweep: Sweep,
    sequencer_counter: u32,
    sequencer_step: u8,
    sample_rate: Option<u32>,
    sample_clock: u64,
    samples: Vec<f32>,
}

impl Apu {
    pub fn new() -> Self {
        Self {
            channels: [Channel::default(); 4],
            sweep: Sweep::default(),
            sequencer_counter: 0,
            sequencer_step: 0,
            sample_rate: None,
            sample_clock: 0,
            samples: Vec::new(),
        }
    }

    /// Start producing interleaved stereo samples at `rate` Hz.
    pub fn enable_output(&mut self, rate: u32) {
        self.sample_rate = (rate > 0).then_some(rate);
        self.sample_clock = 0;
    }

    pub fn take_samples(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.samples)
    }

    pub fn channel_enabled(&self, channel: usize) -> bool {
        self.channels[channel].enabled
    }

    fn dac_enabled(bus: &dyn IoBus, channel: usize) -> bool {
        match channel {
            2 => reg(bus, 2, 0) & 0x80 != 0,
            _ => reg(bus, channel, 2) & 0xF8 != 0,
        }
    }

    fn set_status(bus: &mut dyn IoBus, channel: usize, on: bool) {
        let nr52 = bus.io(NR52);
        let bit = 1 << channel;
        bus.set_io(NR52, if on { nr52 | bit } else { nr52 & !bit });
    }

    fn disable(&mut self, bus: &mut dyn IoBus, channel: usize) {
        self.channels[channel].enabled = false;
        Self::set_status(bus, channel, false);
    }

    /// Restart `channel` (0-3) from its registers after a trigger write.
    pub fn trigger(&mut self, channel: usize, bus: &mut dyn IoBus) {
        let ch = &mut self.channels[channel];
        ch.enabled = true;
        if ch.length == 0 {
            ch.length = if channel == 2 { 256 } else { 64 };
        }
        match channel {
            0 | 1 => {
                ch.timer = (2048 - frequency(bus, channel) as i32) * 4;
                ch.envelope.reload(reg(bus, channel, 2));
            }
            2 => {
                ch.timer = (2048 - frequency(bus, channel) as i32) * 2;
                ch.position = 0;
            }
            _ => {
                ch.timer = Self::noise_period(bus) as i32;
                ch.envelope.reload(reg(bus, channel, 2));
                ch.lfsr = 0x7FFF;
            }
        }

        if channel == 0 {
            let nr10 = bus.io(NR10);
            let period = (nr10 >> 4) & 0x07;
            let shift = nr10 & 0x07;
            self.sweep.shadow = frequency(bus, 0);
            self.sweep.timer = if period == 0 { 8 } else { period };
            self.sweep.enabled = period != 0 || shift != 0;
            if shift != 0 && self.sweep_target(bus) > 2047 {
                self.disable(bus, 0);
                return;
            }
        }

        if !Self::dac_enabled(bus, channel) {
            self.disable(bus, channel);
        }
    }

    /// Length counters reload whenever NRx1 is written.
    pub fn load_length(&mut self, channel: usize, bus: &dyn IoBus) {
        let nrx1 = reg(bus, channel, 1);
        self.channels[channel].length = match channel {
            2 => 256 - nrx1 as u16,
            _ => 64 - (nrx1 & 0x3F) as u16,
        };
    }

    fn noise_period(bus: &dyn IoBus) -> u32 {
        let nr43 = reg(bus, 3, 3);
        NOISE_DIVISORS[(nr43 & 0x07) as usize] << (nr43 >> 4)
    }

    fn sweep_target(&self, bus: &dyn IoBus) -> u16 {
        let nr10 = bus.io(NR10);
        let delta = self.sweep.shadow >> (nr10 & 0x07);
        if nr10 & 0x08 != 0 {
            self.sweep.shadow.wrapping_sub(delta)
        } else {
            self.sweep.shadow + delta
        }
    }

    fn clock_sweep(&mut self, bus: &mut dyn IoBus) {
        let nr10 = bus.io(NR10);
        let period = (nr10 >> 4) & 0x07;
        self.sweep.timer = self.sweep.timer.saturating_sub(1);
        if self.sweep.timer > 0 {
            return;
        }
        self.sweep.timer = if period == 0 { 8 } else { period };
        if !self.sweep.enabled || period == 0 {
            return;
        }
        let target = self.sweep_target(bus);
        if target > 2047 {
            self.disable(bus, 0);
            return;
        }
        if nr10 & 0x07 != 0 {
            self.sweep.shadow = target;
            bus.set_io(NR10 + 3, target as u8);
            let nr14 = bus.io(NR10 + 4);
            bus.set_io(NR10 + 4, (nr14 & !0x07) | (target >> 8) as u8);
            if self.sweep_target(bus) > 2047 {
                self.disable(bus, 0);
            }
        }
    }

    fn clock_lengths(&mut self, bus: &mut dyn IoBus) {
        for channel in 0..4 {
            if reg(bus, channel, 4) & 0x40 == 0 || self.channels[channel].length == 0 {
                continue;
            }
            self.channels[channel].length -= 1;
            if self.channels[channel].length == 0 {
                self.disable(bus, channel);
            }
        }
    }

    fn clock_frame_sequencer(&mut self, bus: &mut dyn IoBus) {
        let step = self.sequencer_step;
        self.sequencer_step = (step + 1) & 0x07;
        if step % 2 == 0 {
            self.clock_lengths(bus);
        }
        if step == 2 || step == 6 {
            self.clock_sweep(bus);
        }
        if step == 7 {
            for channel in [0, 1, 3] {
                self.channels[channel].envelope.clock();
            }
        }
    }

    fn advance_timers(&mut self, cycles: u32, bus: &dyn IoBus) {
        for channel in 0..4 {
            if !self.channels[channel].enabled {
                continue;
            }
            let period = match channel {
                0 | 1 => (2048 - frequency(bus, channel) as i32) * 4,
                2 => (2048 - frequency(bus, channel) as i32) * 2,
                _ => Self::noise_period(bus) as i32,
            };
            let short_lfsr = reg(bus, 3, 3) & 0x08 != 0;
            let ch = &mut self.channels[channel];
            ch.timer -= cycles as i32;
            while ch.timer <= 0 {
                ch.timer += period.max(1);
                match channel {
                    0 | 1 => ch.position = (ch.position + 1) & 0x07,
                    2 => ch.position = (ch.position + 1) & 0x1F,
                    _ => {
                        let bit = (ch.lfsr ^ (ch.lfsr >> 1)) & 0x01;
                        ch.lfsr = (ch.lfsr >> 1) | (bit << 14);
                        if short_lfsr {
                            ch.lfsr = (ch.lfsr & !0x40) | (bit << 6);
                        }
                    }
                }
            }
        }
    }

    /// Digital output of a channel, 0-15.
    fn channel_output(&self, channel: usize, bus: &dyn IoBus) -> u8 {
        let ch = &self.channels[channel];
        if !ch.enabled {
            return 0;
        }
        match channel {
            0 | 1 => {
                let duty = (reg(bus, channel, 1) >> 6) as usize;
                DUTY_TABLE[duty][ch.position as usize] * ch.envelope.volume
            }
            2 => {
                let byte = bus.io(WAVE_RAM + (ch.position / 2) as u16);
                let sample = if ch.position % 2 == 0 {
                    byte >> 4
                } else {
                    byte & 0x0F
                };
                match (reg(bus, 2, 2) >> 5) & 0x03 {
                    0 => 0,
                    shift => sample >> (shift - 1),
                }
            }
            _ => {
                if ch.lfsr & 0x01 == 0 {
                    ch.envelope.volume
                } else {
                    0
                }
            }
        }
    }

    fn mix(&self, bus: &dyn IoBus) -> (f32, f32) {
        let panning = bus.io(NR51);
        let nr50 = bus.io(NR50);
        let mut left = 0.0;
        let mut right = 0.0;
        for channel in 0..4 {
            if !Self::dac_enabled(bus, channel) {
                continue;
            }
            let analog = self.channel_output(channel, bus) as f32 / 7.5 - 1.0;
            if panning & (0x10 << channel) != 0 {
                left += analog;
            }
            if panning & (0x01 << channel) != 0 {
                right += analog;
            }
        }
        let left_vol = (((nr50 >> 4) & 0x07) + 1) as f32 / 8.0;
        let right_vol = ((nr50 & 0x07) + 1) as f32 / 8.0;
        (left * left_vol / 4.0, right * right_vol / 4.0)
    }

    /// Advance every channel by `cycles`.
    pub fn step(&mut self, cycles: u32, bus: &mut dyn IoBus) {
        if bus.io(NR52) & 0x80 == 0 {
            if self.channels.iter().any(|c| c.enabled) {
                self.channels = [Channel::default(); 4];
                self.sweep = Sweep::default();
                self.sequencer_step = 0;
            }
        } else {
            self.advance_timers(cycles, bus);
            self.sequencer_counter += cycles;
            while self.sequencer_counter >= FRAME_SEQUENCER_PERIOD {
                self.sequencer_counter -= FRAME_SEQUENCER_PERIOD;
                self.clock_frame_sequencer(bus);
            }
        }

        let Some(rate) = self.sample_rate else {
            return;
        };
        self.sample_clock += cycles as u64 * rate as u64;
        while self.sample_clock >= CPU_CLOCK_HZ {
            self.sample_clock -= CPU_CLOCK_HZ;
            let (left, right) = self.mix(bus);
            self.samples.push(left);
            self.samples.push(right);
        }
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}
