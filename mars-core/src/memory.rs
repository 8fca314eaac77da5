use rand::{seq::SliceRandom, Rng, RngCore};
use redcode::{DecodeError, Instruction, Mode};

use crate::{
    error::{CoreError, CoreResult, RuntimeError},
    sector::{Sector, SectorSet},
    CoreAddr,
};

/// The shared circular core.
///
/// Cells hold raw 32-bit words and decode to instructions on read.  All
/// indexing wraps modulo the core size, so no read or write can fault
/// from the warriors' point of view.  A [`SectorSet`] tracks the regions
/// not yet occupied by any warrior or write: allocation consumes from
/// it, and every direct write carves its target cell out of it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Memory {
    /// The raw cell words.  A fresh core is all zeros, the encoding of
    /// `DAT #0, #0`.
    cells: Vec<i32>,
    /// The regions still free for allocation
    free: SectorSet,
}

impl Memory {
    /// Construct a zeroed core of `size` cells, all of them free.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParam`] for a zero size.
    pub fn new(size: usize) -> CoreResult<Self> {
        if size == 0 {
            return Err(CoreError::InvalidParam("memory size must be at least 1"));
        }
        Ok(Self {
            cells: vec![0; size],
            free: SectorSet::whole(size),
        })
    }

    /// Number of cells in the core
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// A core always has at least one cell
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reduce any signed index to its canonical core address.
    #[must_use]
    pub fn wrap(&self, index: i64) -> CoreAddr {
        index.rem_euclid(self.cells.len() as i64) as CoreAddr
    }

    /// Read the raw word at an index, wrapping as needed.
    #[must_use]
    pub fn read(&self, index: i64) -> i32 {
        let wrapped = self.wrap(index);
        self.cells.get(wrapped).copied().unwrap_or(0)
    }

    /// Write a raw word at an index, wrapping as needed.
    ///
    /// The written cell counts as occupied and leaves the free set.
    pub fn write(&mut self, index: i64, value: i32) {
        let wrapped = self.wrap(index);
        self.store(wrapped, value);
        if let Some(occupied) = Sector::new(wrapped, wrapped + 1) {
            self.free.carve(&occupied);
        }
    }

    /// Decode the cell at an index into an instruction.
    ///
    /// # Errors
    ///
    /// Returns the [`DecodeError`] for a word whose opcode or mode bits
    /// are invalid.
    pub fn instruction_at(&self, index: i64) -> Result<Instruction, DecodeError> {
        Instruction::decode(self.read(index) as u32)
    }

    /// Render the cell at an index as assembly text, `"???"` when it
    /// does not decode.
    #[must_use]
    pub fn render(&self, index: i64) -> String {
        self.instruction_at(index)
            .map_or_else(|_| "???".into(), |instruction| instruction.to_string())
    }

    /// Render the whole core as a JSON array of assembly strings.
    ///
    /// # Errors
    ///
    /// Passes through any `serde_json` serialization failure.
    pub fn render_json(&self) -> serde_json::Result<String> {
        let rendered: Vec<String> =
            (0..self.cells.len()).map(|i| self.render(i as i64)).collect();
        serde_json::to_string(&rendered)
    }

    /// Resolve an operand to the core address it targets.
    ///
    /// Relative operands offset from `ip`; indirect operands resolve the
    /// relative pointer first and then hop through the full raw value of
    /// the pointed-at cell.  Both hops wrap.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::BadMode`] for an immediate operand, which
    /// has a value but no address.
    pub fn address(
        &self,
        mode: Mode,
        value: i32,
        ip: CoreAddr,
    ) -> Result<CoreAddr, RuntimeError> {
        match mode {
            Mode::Immediate => Err(RuntimeError::BadMode(mode)),
            Mode::Relative => Ok(self.wrap(ip as i64 + i64::from(value))),
            Mode::Indirect => {
                let pointer = self.wrap(ip as i64 + i64::from(value));
                Ok(self
                    .wrap(pointer as i64 + i64::from(self.read(pointer as i64))))
            }
        }
    }

    /// Resolve an operand to the value it names: the literal for an
    /// immediate operand, otherwise the raw word at the resolved address.
    ///
    /// # Errors
    ///
    /// Never fails for the three dialect modes; shares
    /// [`Memory::address`]'s error path.
    pub fn value(
        &self,
        mode: Mode,
        value: i32,
        ip: CoreAddr,
    ) -> Result<i64, RuntimeError> {
        match mode {
            Mode::Immediate => Ok(i64::from(value)),
            Mode::Relative | Mode::Indirect => {
                let address = self.address(mode, value, ip)?;
                Ok(i64::from(self.read(address as i64)))
            }
        }
    }

    /// Place a program in the core and return its start address.
    ///
    /// With `overwrite` set (test/helper mode) the start is uniform over
    /// every position where the code fits, existing contents are
    /// clobbered, and the free set is neither consulted nor updated.
    /// In battle mode a free sector large enough for the code is chosen
    /// uniformly at random, an offset inside it is chosen uniformly at
    /// random, and the occupied range leaves the free set.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OutOfMemory`] when the code is larger than
    /// the core, or when no free sector can hold it; an empty program is
    /// an [`CoreError::InvalidParam`].
    pub fn allocate(
        &mut self,
        code: &[Instruction],
        overwrite: bool,
        rng: &mut dyn RngCore,
    ) -> CoreResult<CoreAddr> {
        if code.is_empty() {
            return Err(CoreError::InvalidParam(
                "cannot allocate an empty program",
            ));
        }
        if code.len() > self.cells.len() {
            return Err(CoreError::OutOfMemory {
                requested: code.len(),
            });
        }

        let start = if overwrite {
            rng.gen_range(0..=(self.cells.len() - code.len()))
        } else {
            let candidates: Vec<Sector> =
                self.free.blocks_at_least(code.len()).copied().collect();
            let sector = candidates.choose(rng).ok_or(CoreError::OutOfMemory {
                requested: code.len(),
            })?;
            let offset = rng.gen_range(0..=(sector.len() - code.len()));
            sector.start() + offset
        };

        for (offset, instruction) in code.iter().enumerate() {
            self.store(start + offset, instruction.encode() as i32);
        }
        if !overwrite {
            if let Some(occupied) = Sector::new(start, start + code.len()) {
                self.free.carve(&occupied);
            }
        }
        Ok(start)
    }

    /// Zero every cell and return the whole core to the free set,
    /// keeping the size.
    pub fn reset(&mut self) {
        self.cells.fill(0);
        self.free = SectorSet::whole(self.cells.len());
    }

    /// The regions not yet occupied by any warrior or write
    #[must_use]
    pub const fn free_sectors(&self) -> &SectorSet {
        &self.free
    }

    /// The raw cell words in core order
    #[must_use]
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Write a word without touching the free set.
    fn store(&mut self, index: CoreAddr, value: i32) {
        if let Some(cell) = self.cells.get_mut(index) {
            *cell = value;
        }
    }
}
