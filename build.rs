use std::env;
use std::f64::consts::PI;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const WAVETABLE_SIZE: usize = 600;

/// Each table is an additive stack of harmonics with a given falloff; this
/// covers a handful of classic wavetable-synth timbres without depending on
/// any shipped `.wav` assets.
const HARMONIC_STACKS: &[(&[f32], f32)] = &[
    (&[1.0], 0.0),                         // pure sine
    (&[1.0, 0.5, 0.33, 0.25, 0.2, 0.16], 0.0), // sawtooth-ish, 6 harmonics
    (&[1.0, 0.0, 0.33, 0.0, 0.2, 0.0, 0.14], 0.0), // square-ish, odd harmonics
    (&[1.0, 0.0, -0.11, 0.0, 0.04], 0.0),  // triangle-ish, odd harmonics alternating sign
    (&[1.0, 0.6, 0.3, 0.9, 0.15, 0.45, 0.1], 0.15), // inharmonic/bell-ish
    (&[1.0, 0.8, 0.64, 0.51, 0.41, 0.33, 0.26, 0.21], 0.0), // dense/organ-ish
    (&[1.0, 0.2, 0.05, 0.02], 0.4),        // formant-ish, fast falloff + detune
    (&[1.0, 0.9, 0.1, 0.8, 0.05, 0.7], 0.05), // vocal/"ooh"-ish
];

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("wavetables.rs");
    let mut f = File::create(&dest_path).unwrap();

    writeln!(f, "// Auto-generated wavetables from build.rs").unwrap();
    writeln!(f, "use std::sync::OnceLock;").unwrap();
    writeln!(f).unwrap();
    writeln!(f, "pub const WAVETABLE_SIZE: usize = {};", WAVETABLE_SIZE).unwrap();
    writeln!(f, "pub const NUM_WAVETABLES: usize = {};", HARMONIC_STACKS.len()).unwrap();
    writeln!(f).unwrap();

    for (index, (harmonics, detune)) in HARMONIC_STACKS.iter().enumerate() {
        let samples = synthesize_table(harmonics, *detune as f64);

        writeln!(f, "const WAVETABLE_{}: [f32; WAVETABLE_SIZE] = [", index).unwrap();
        for (i, sample) in samples.iter().enumerate() {
            if i % 8 == 0 {
                write!(f, "    ").unwrap();
            }
            write!(f, "{:>12.8}", sample).unwrap();
            if i < samples.len() - 1 {
                write!(f, ",").unwrap();
            }
            if i % 8 == 7 || i == samples.len() - 1 {
                writeln!(f).unwrap();
            }
        }
        writeln!(f, "];").unwrap();
        writeln!(f).unwrap();
    }

    writeln!(
        f,
        "pub static WAVETABLES: OnceLock<&'static [&'static [f32; WAVETABLE_SIZE]]> = OnceLock::new();"
    )
    .unwrap();
    writeln!(f).unwrap();
    writeln!(f, "pub fn get_wavetables() -> &'static [&'static [f32; WAVETABLE_SIZE]] {{").unwrap();
    writeln!(f, "    WAVETABLES.get_or_init(|| &[").unwrap();
    for i in 0..HARMONIC_STACKS.len() {
        writeln!(f, "        &WAVETABLE_{},", i).unwrap();
    }
    writeln!(f, "    ])").unwrap();
    writeln!(f, "}}").unwrap();
    writeln!(f).unwrap();
    writeln!(f, "pub fn get_wavetable(index: usize) -> &'static [f32; WAVETABLE_SIZE] {{").unwrap();
    writeln!(f, "    let tables = get_wavetables();").unwrap();
    writeln!(f, "    tables[index % tables.len()]").unwrap();
    writeln!(f, "}}").unwrap();

    println!("cargo:rerun-if-changed=build.rs");
}

/// Additively synthesizes one cycle, normalizing to unity peak and applying a
/// small amount of harmonic detune for the "inharmonic" stacks.
fn synthesize_table(harmonics: &[f32], detune: f64) -> Vec<f32> {
    let mut samples = vec![0.0f64; WAVETABLE_SIZE];
    for (h_index, &amplitude) in harmonics.iter().enumerate() {
        if amplitude == 0.0 {
            continue;
        }
        let harmonic_number = (h_index + 1) as f64 * (1.0 + detune * (h_index as f64) * 0.002);
        for (i, sample) in samples.iter_mut().enumerate() {
            let phase = (i as f64 / WAVETABLE_SIZE as f64) * 2.0 * PI * harmonic_number;
            *sample += amplitude as f64 * phase.sin();
        }
    }

    let peak = samples.iter().fold(0.0f64, |m, &v| m.max(v.abs())).max(1e-9);
    samples.iter().map(|&v| (v / peak) as f32).collect()
}
