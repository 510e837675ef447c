//! Thin façade over the collective operations the partitioning pipeline
//! needs: rank/size queries, broadcast, and allgather.
//!
//! Messages are *contiguous byte slices* (no zero-copy guarantees); typed
//! vectors go through [`broadcast_vec`], which casts via `bytemuck`. Both
//! collectives must be called by every rank — skipping one conditionally on
//! local state is the classic deadlock this interface is shaped to prevent.

/// Collective communication interface (minimal by design).
pub trait Communicator {
    /// Rank of this process in `[0, size)`.
    fn rank(&self) -> usize;

    /// Number of participating processes.
    fn size(&self) -> usize;

    /// Collective: replace `buf` on every rank with root's bytes.
    ///
    /// On `root` the buffer is the input; on all other ranks its prior
    /// contents are discarded.
    fn broadcast_bytes(&self, root: usize, buf: &mut Vec<u8>);

    /// Collective: gather each rank's bytes; returns one buffer per rank,
    /// indexed by rank, identical on every process.
    fn allgather_bytes(&self, mine: &[u8]) -> Vec<Vec<u8>>;
}

/// Collective broadcast of a typed vector from `root`.
pub fn broadcast_vec<T: bytemuck::Pod, C: Communicator + ?Sized>(
    comm: &C,
    root: usize,
    data: &mut Vec<T>,
) {
    if comm.size() == 1 {
        return;
    }
    let mut bytes: Vec<u8> = bytemuck::cast_slice(data.as_slice()).to_vec();
    comm.broadcast_bytes(root, &mut bytes);
    *data = bytemuck::cast_slice(&bytes).to_vec();
}

/// Compile-time no-op comm for pure serial runs and unit tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoComm;

impl Communicator for NoComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast_bytes(&self, _root: usize, _buf: &mut Vec<u8>) {}

    fn allgather_bytes(&self, mine: &[u8]) -> Vec<Vec<u8>> {
        vec![mine.to_vec()]
    }
}

// --- MPI backend (feature = "mpi-support") ---
#[cfg(feature = "mpi-support")]
mod mpi_backend {
    use super::Communicator;
    use mpi::datatype::PartitionMut;
    use mpi::topology::SimpleCommunicator;
    use mpi::traits::*;

    /// MPI-backed communicator over a world (or duplicated) communicator.
    pub struct MpiComm {
        world: SimpleCommunicator,
    }

    impl MpiComm {
        pub fn new(world: SimpleCommunicator) -> Self {
            Self { world }
        }
    }

    impl Communicator for MpiComm {
        fn rank(&self) -> usize {
            self.world.rank() as usize
        }

        fn size(&self) -> usize {
            self.world.size() as usize
        }

        fn broadcast_bytes(&self, root: usize, buf: &mut Vec<u8>) {
            let root_proc = self.world.process_at_rank(root as i32);
            let mut len = buf.len() as u64;
            root_proc.broadcast_into(&mut len);
            buf.resize(len as usize, 0);
            if len > 0 {
                root_proc.broadcast_into(&mut buf[..]);
            }
        }

        fn allgather_bytes(&self, mine: &[u8]) -> Vec<Vec<u8>> {
            let size = self.size();
            let mut counts = vec![0i32; size];
            self.world
                .all_gather_into(&(mine.len() as i32), &mut counts[..]);
            let displs: Vec<i32> = counts
                .iter()
                .scan(0, |acc, &c| {
                    let d = *acc;
                    *acc += c;
                    Some(d)
                })
                .collect();
            let total: i32 = counts.iter().sum();
            let mut recv = vec![0u8; total as usize];
            {
                let mut recvbuf = PartitionMut::new(&mut recv[..], &counts[..], &displs[..]);
                self.world.all_gather_varcount_into(mine, &mut recvbuf);
            }
            counts
                .iter()
                .zip(&displs)
                .map(|(&c, &d)| recv[d as usize..(d + c) as usize].to_vec())
                .collect()
        }
    }
}

#[cfg(feature = "mpi-support")]
pub use mpi_backend::MpiComm;
