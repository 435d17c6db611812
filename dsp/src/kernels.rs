//! Synthetic compute kernels exercising the core's integer datapath.
//!
//! These are load generators, not real algorithms: small fixed-size
//! loops whose timing characterizes the core under different access
//! patterns. Input generation sits outside the measured window so the
//! cycle figure covers compute only. Each kernel folds its inputs into
//! a scalar result that seeds the next invocation, which keeps the
//! loops observable and the inputs varying between iterations.

use crate::monotonic::{Monotonic, Timing};

/// Result and cycle estimate of one kernel invocation.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KernelRun {
    pub result: u32,
    pub elapsed_cycles: u64,
}

/// 4x4 integer matrix product with wrapping 16-bit accumulation.
#[must_use]
pub fn matrix_multiply<M: Monotonic>(seed: u32, timing: &Timing<M>) -> KernelRun {
    let mut a = [[0i16; 4]; 4];
    let mut b = [[0i16; 4]; 4];
    let mut c = [[0i16; 4]; 4];
    for i in 0..4 {
        for j in 0..4 {
            a[i][j] = (((i + j) as u32).wrapping_add(seed) & 0xFF) as i16;
            b[i][j] = (((i * j) as u32).wrapping_add(seed) & 0xFF) as i16;
        }
    }

    let stopwatch = timing.stopwatch();
    for i in 0..4 {
        for j in 0..4 {
            for k in 0..4 {
                let product = i32::from(a[i][k]) * i32::from(b[k][j]);
                c[i][j] = c[i][j].wrapping_add(product as i16);
            }
        }
    }
    let elapsed_cycles = stopwatch.elapsed_cycles();

    KernelRun {
        result: i32::from(c[0][0]) as u32,
        elapsed_cycles,
    }
}

/// Bubble sort over 32 pseudo-random elements.
#[must_use]
pub fn bubble_sort<M: Monotonic>(seed: u32, timing: &Timing<M>) -> KernelRun {
    let mut values = [0i32; 32];
    for (i, x) in values.iter_mut().enumerate() {
        *x = ((i as u32 * 7 + 13).wrapping_add(seed) & 0xFFFF) as i32;
    }

    let stopwatch = timing.stopwatch();
    for i in 0..31 {
        for j in 0..31 - i {
            if values[j] > values[j + 1] {
                values.swap(j, j + 1);
            }
        }
    }
    let elapsed_cycles = stopwatch.elapsed_cycles();

    KernelRun {
        result: values[0] as u32,
        elapsed_cycles,
    }
}

/// Four stages of radix-2 butterfly passes over a 16-point buffer.
#[must_use]
pub fn fft_butterflies<M: Monotonic>(seed: u32, timing: &Timing<M>) -> KernelRun {
    let mut real = [0i32; 16];
    let mut imag = [0i32; 16];
    for (i, x) in real.iter_mut().enumerate() {
        *x = ((i as u32 * 100).wrapping_add(seed) & 0xFFFF) as i32;
    }

    let stopwatch = timing.stopwatch();
    for _stage in 0..4 {
        let mut i = 0;
        while i < 16 {
            let tr = real[i] + real[i + 1];
            let ti = imag[i] + imag[i + 1];
            real[i + 1] = real[i] - real[i + 1];
            imag[i + 1] = imag[i] - imag[i + 1];
            real[i] = tr;
            imag[i] = ti;
            i += 2;
        }
    }
    let elapsed_cycles = stopwatch.elapsed_cycles();

    KernelRun {
        result: real[0] as u32,
        elapsed_cycles,
    }
}

/// Four rounds of substitute, shift, and mix over a 16-byte state.
#[must_use]
pub fn crypto_rounds<M: Monotonic>(seed: u32, timing: &Timing<M>) -> KernelRun {
    let mut state = [0u8; 16];
    let mut key = [0u8; 16];
    for i in 0..16 {
        state[i] = (i as u32).wrapping_add(seed) as u8;
        key[i] = (15 - i) as u8;
    }

    let stopwatch = timing.stopwatch();
    for _round in 0..4 {
        for i in 0..16 {
            state[i] = (state[i] ^ key[i]).wrapping_add(state[i] << 1);
        }

        let temp = state[1];
        state[1] = state[5];
        state[5] = state[9];
        state[9] = state[13];
        state[13] = temp;

        for column in 0..4 {
            let a = state[column * 4];
            let b = state[column * 4 + 1];
            state[column * 4] = a ^ b;
            state[column * 4 + 1] = b ^ a;
        }
    }
    let elapsed_cycles = stopwatch.elapsed_cycles();

    KernelRun {
        result: u32::from(state[0]),
        elapsed_cycles,
    }
}

/// Runs all four kernels back to back, threading each result into the
/// next kernel's inputs, and sums their cycle estimates.
#[must_use]
pub fn mixed<M: Monotonic>(seed: u32, timing: &Timing<M>) -> KernelRun {
    let matrix = matrix_multiply(seed, timing);
    let sort = bubble_sort(matrix.result, timing);
    let fft = fft_butterflies(sort.result, timing);
    let crypto = crypto_rounds(fft.result, timing);

    KernelRun {
        result: crypto.result,
        elapsed_cycles: matrix.elapsed_cycles
            + sort.elapsed_cycles
            + fft.elapsed_cycles
            + crypto.elapsed_cycles,
    }
}
