use varpart::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

const CAPACITY: ByteSteps = 1 << 12;
const MAX_REQ: ByteSteps = 1 << 9;
const STEPS: usize = 2_000;

// Placement policies live with the caller. These two are just enough
// to drive the engine through realistic layouts.
#[derive(Copy, Clone, Debug)]
enum Fit {
    First,
    Best,
}

fn pick(space: &AddressSpace, size: ByteSteps, fit: Fit) -> Option<RegionId> {
    let candidates = space.free_set()
        .iter()
        .filter(|(_, r)| r.size() >= size);
    match fit {
        Fit::First  => {
            candidates
                .min_by_key(|(_, r)| r.start())
                .map(|(id, _)| id)
        },
        Fit::Best   => {
            candidates
                .min_by_key(|(_, r)| (r.size(), r.start()))
                .map(|(id, _)| id)
        },
    }
}

/// Runs a random sequence of placements and releases, checking the
/// tiling after every single step. Returns how many placements went
/// through.
fn simulate(seed: u64, fit: Fit) -> anyhow::Result<usize> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut space = AddressSpace::new(0, CAPACITY)?;
    let mut live: Vec<ProcessId> = vec![];
    let mut placed = 0;

    for step in 0..STEPS {
        let wants_release = !live.is_empty() && rng.gen_bool(0.4);
        let size = rng.gen_range(1..=MAX_REQ);
        let target = if wants_release { None } else { pick(&space, size, fit) };
        match target {
            Some(id)    => {
                let name = format!("P{step}");
                let p = Process::new(name.as_str(), size, step, rng.gen_range(1..50))?;
                let span = space.place(id, p)?;
                assert_eq!(span.size(), size);
                live.push(ProcessId::new(name));
                placed += 1;
            },
            None        => {
                if live.is_empty() { continue; }
                let victim = live.swap_remove(rng.gen_range(0..live.len()));
                space.release(&victim)?;
            },
        }
        space.validate()?;
        let owned = space.partitions().map(|p| p.size()).sum::<ByteSteps>();
        assert_eq!(owned + space.free_set().total_size(), CAPACITY);
        assert_eq!(space.partitions().count(), live.len());
    }

    for victim in live.drain(..) {
        space.release(&victim)?;
        space.validate()?;
    }
    assert_eq!(space.free_set().spans(), vec![Region::new(0, CAPACITY)?]);

    Ok(placed)
}

#[test]
fn first_fit_keeps_tiling() -> anyhow::Result<()> {
    let placed = simulate(0xC0FFEE, Fit::First)?;
    assert!(placed > 0);

    Ok(())
}

#[test]
fn best_fit_keeps_tiling() -> anyhow::Result<()> {
    let placed = simulate(0xBEEF, Fit::Best)?;
    assert!(placed > 0);

    Ok(())
}

#[test]
fn independent_simulations_in_parallel() -> anyhow::Result<()> {
    // Each simulation owns its address space; nothing is shared.
    let placed = (0..16u64)
        .into_par_iter()
        .map(|seed| {
            let fit = if seed % 2 == 0 { Fit::First } else { Fit::Best };
            simulate(seed, fit)
        })
        .collect::<anyhow::Result<Vec<usize>>>()?;
    assert_eq!(placed.len(), 16);

    Ok(())
}
