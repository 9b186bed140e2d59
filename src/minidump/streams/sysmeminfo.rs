//! System-wide memory counters (`SystemMemoryInfoStream`, type 21).
//!
//! A singleton record the dump writer fills from the kernel's system information
//! classes at capture time: basic machine parameters, file cache state, and the full
//! system performance counter block. All counters are stored as fixed-width
//! little-endian words regardless of the target's pointer size, so the record decodes
//! identically for 32- and 64-bit dumps.
//!
//! The `flags` word marks which late-addition fields the writer's kernel actually
//! reported; ungated fields are always present in the record, merely zero on old
//! systems.

use crate::{
    file::{io::read_le_at, Backend},
    minidump::{directory::DirectoryEntry, streams::stream_slice},
    Result,
};

/// Size in bytes of the on-disk system memory info record.
pub const SYSTEM_MEMORY_INFO_SIZE: usize = 756;

/// `flags` bit: the file cache transition/repurpose fields are valid.
pub const SYSMEMINFO_FILECACHE_TRANSITION_REPURPOSE_VALID: u16 = 0x0001;
/// `flags` bit: the basic performance block is valid.
pub const SYSMEMINFO_BASICPERF_VALID: u16 = 0x0002;
/// `flags` bit: the dirty page counters at the end of the performance block are valid.
pub const SYSMEMINFO_PERF_CCTOTALDIRTYPAGES_VALID: u16 = 0x0004;
/// `flags` bit: the resident/shared commit counters are valid.
pub const SYSMEMINFO_PERF_RESIDENTAVAILABLE_VALID: u16 = 0x0008;

/// Basic machine parameters (`SYSTEM_BASIC_INFORMATION`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemBasicInfo {
    /// Timer resolution in 100ns units
    pub timer_resolution: u32,
    /// Page size in bytes
    pub page_size: u32,
    /// Number of physical pages in the machine
    pub number_of_physical_pages: u32,
    /// Lowest physical page number
    pub lowest_physical_page_number: u32,
    /// Highest physical page number
    pub highest_physical_page_number: u32,
    /// Virtual allocation granularity in bytes
    pub allocation_granularity: u32,
    /// Lowest user-mode address
    pub minimum_user_mode_address: u64,
    /// Highest user-mode address
    pub maximum_user_mode_address: u64,
    /// Affinity mask of active processors
    pub active_processors_affinity_mask: u64,
    /// Number of logical processors
    pub number_of_processors: u32,
}

impl SystemBasicInfo {
    fn read(data: &[u8], offset: &mut usize) -> Result<SystemBasicInfo> {
        Ok(SystemBasicInfo {
            timer_resolution: read_le_at::<u32>(data, offset)?,
            page_size: read_le_at::<u32>(data, offset)?,
            number_of_physical_pages: read_le_at::<u32>(data, offset)?,
            lowest_physical_page_number: read_le_at::<u32>(data, offset)?,
            highest_physical_page_number: read_le_at::<u32>(data, offset)?,
            allocation_granularity: read_le_at::<u32>(data, offset)?,
            minimum_user_mode_address: read_le_at::<u64>(data, offset)?,
            maximum_user_mode_address: read_le_at::<u64>(data, offset)?,
            active_processors_affinity_mask: read_le_at::<u64>(data, offset)?,
            number_of_processors: read_le_at::<u32>(data, offset)?,
        })
    }
}

/// File cache state (`SYSTEM_FILECACHE_INFORMATION`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemFileCacheInfo {
    /// Current cache size in bytes
    pub current_size: u64,
    /// Peak cache size in bytes
    pub peak_size: u64,
    /// Cache page fault count
    pub page_fault_count: u32,
    /// Minimum cache working set in bytes
    pub minimum_working_set: u64,
    /// Maximum cache working set in bytes
    pub maximum_working_set: u64,
    /// Current size including transition pages, in pages
    pub current_size_including_transition_in_pages: u64,
    /// Peak size including transition pages, in pages
    pub peak_size_including_transition_in_pages: u64,
    /// Transition repurpose count, gated by
    /// [`SYSMEMINFO_FILECACHE_TRANSITION_REPURPOSE_VALID`]
    pub transition_repurpose_count: u32,
    /// Cache flags
    pub flags: u32,
}

impl SystemFileCacheInfo {
    fn read(data: &[u8], offset: &mut usize) -> Result<SystemFileCacheInfo> {
        Ok(SystemFileCacheInfo {
            current_size: read_le_at::<u64>(data, offset)?,
            peak_size: read_le_at::<u64>(data, offset)?,
            page_fault_count: read_le_at::<u32>(data, offset)?,
            minimum_working_set: read_le_at::<u64>(data, offset)?,
            maximum_working_set: read_le_at::<u64>(data, offset)?,
            current_size_including_transition_in_pages: read_le_at::<u64>(data, offset)?,
            peak_size_including_transition_in_pages: read_le_at::<u64>(data, offset)?,
            transition_repurpose_count: read_le_at::<u32>(data, offset)?,
            flags: read_le_at::<u32>(data, offset)?,
        })
    }
}

/// Commit summary (`SYSTEM_BASIC_PERFORMANCE_INFORMATION`), gated by
/// [`SYSMEMINFO_BASICPERF_VALID`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemBasicPerfInfo {
    /// Pages available for allocation
    pub available_pages: u64,
    /// Committed pages
    pub committed_pages: u64,
    /// Commit limit in pages
    pub commit_limit: u64,
    /// Peak commitment in pages
    pub peak_commitment: u64,
}

impl SystemBasicPerfInfo {
    fn read(data: &[u8], offset: &mut usize) -> Result<SystemBasicPerfInfo> {
        Ok(SystemBasicPerfInfo {
            available_pages: read_le_at::<u64>(data, offset)?,
            committed_pages: read_le_at::<u64>(data, offset)?,
            commit_limit: read_le_at::<u64>(data, offset)?,
            peak_commitment: read_le_at::<u64>(data, offset)?,
        })
    }
}

/// The full system performance counter block (`SYSTEM_PERFORMANCE_INFORMATION`),
/// widened to 64-bit words by the dump format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemPerfInfo {
    /// Cumulative idle process time
    pub idle_process_time: u64,
    /// Bytes transferred by read I/O
    pub io_read_transfer_count: u64,
    /// Bytes transferred by write I/O
    pub io_write_transfer_count: u64,
    /// Bytes transferred by other I/O
    pub io_other_transfer_count: u64,
    /// Read I/O operations
    pub io_read_operation_count: u64,
    /// Write I/O operations
    pub io_write_operation_count: u64,
    /// Other I/O operations
    pub io_other_operation_count: u64,
    /// Pages available for allocation
    pub available_pages: u64,
    /// Committed pages
    pub committed_pages: u64,
    /// Commit limit in pages
    pub commit_limit: u64,
    /// Peak commitment in pages
    pub peak_commitment: u64,
    /// Page faults
    pub page_fault_count: u64,
    /// Copy-on-write faults
    pub copy_on_write_count: u64,
    /// Transition faults
    pub transition_count: u64,
    /// Cache transition faults
    pub cache_transition_count: u64,
    /// Demand-zero faults
    pub demand_zero_count: u64,
    /// Pages read from disk
    pub page_read_count: u64,
    /// Page read I/O operations
    pub page_read_io_count: u64,
    /// Cache pages read
    pub cache_read_count: u64,
    /// Cache read I/O operations
    pub cache_io_count: u64,
    /// Dirty pages written
    pub dirty_pages_write_count: u64,
    /// Dirty page write I/O operations
    pub dirty_write_io_count: u64,
    /// Mapped pages written
    pub mapped_pages_write_count: u64,
    /// Mapped page write I/O operations
    pub mapped_write_io_count: u64,
    /// Paged pool pages in use
    pub paged_pool_pages: u64,
    /// Non-paged pool pages in use
    pub non_paged_pool_pages: u64,
    /// Paged pool allocations
    pub paged_pool_allocs: u64,
    /// Paged pool frees
    pub paged_pool_frees: u64,
    /// Non-paged pool allocations
    pub non_paged_pool_allocs: u64,
    /// Non-paged pool frees
    pub non_paged_pool_frees: u64,
    /// Free system page table entries
    pub free_system_ptes: u64,
    /// Resident system code pages
    pub resident_system_code_page: u64,
    /// Total driver pages
    pub total_system_driver_pages: u64,
    /// Total system code pages
    pub total_system_code_pages: u64,
    /// Non-paged pool lookaside hits
    pub non_paged_pool_lookaside_hits: u64,
    /// Paged pool lookaside hits
    pub paged_pool_lookaside_hits: u64,
    /// Available paged pool pages
    pub available_paged_pool_pages: u64,
    /// Resident system cache pages
    pub resident_system_cache_page: u64,
    /// Resident paged pool pages
    pub resident_paged_pool_page: u64,
    /// Resident driver pages
    pub resident_system_driver_page: u64,
    /// Fast read operations without wait
    pub cc_fast_read_no_wait: u64,
    /// Fast read operations with wait
    pub cc_fast_read_wait: u64,
    /// Fast reads failing on resource contention
    pub cc_fast_read_resource_miss: u64,
    /// Fast reads not possible
    pub cc_fast_read_not_possible: u64,
    /// Fast MDL reads without wait
    pub cc_fast_mdl_read_no_wait: u64,
    /// Fast MDL reads with wait
    pub cc_fast_mdl_read_wait: u64,
    /// Fast MDL reads failing on resource contention
    pub cc_fast_mdl_read_resource_miss: u64,
    /// Fast MDL reads not possible
    pub cc_fast_mdl_read_not_possible: u64,
    /// Map-data operations without wait
    pub cc_map_data_no_wait: u64,
    /// Map-data operations with wait
    pub cc_map_data_wait: u64,
    /// Map-data misses without wait
    pub cc_map_data_no_wait_miss: u64,
    /// Map-data misses with wait
    pub cc_map_data_wait_miss: u64,
    /// Pinned mapped data count
    pub cc_pin_mapped_data_count: u64,
    /// Pin-read operations without wait
    pub cc_pin_read_no_wait: u64,
    /// Pin-read operations with wait
    pub cc_pin_read_wait: u64,
    /// Pin-read misses without wait
    pub cc_pin_read_no_wait_miss: u64,
    /// Pin-read misses with wait
    pub cc_pin_read_wait_miss: u64,
    /// Copy-read operations without wait
    pub cc_copy_read_no_wait: u64,
    /// Copy-read operations with wait
    pub cc_copy_read_wait: u64,
    /// Copy-read misses without wait
    pub cc_copy_read_no_wait_miss: u64,
    /// Copy-read misses with wait
    pub cc_copy_read_wait_miss: u64,
    /// MDL reads without wait
    pub cc_mdl_read_no_wait: u64,
    /// MDL reads with wait
    pub cc_mdl_read_wait: u64,
    /// MDL read misses without wait
    pub cc_mdl_read_no_wait_miss: u64,
    /// MDL read misses with wait
    pub cc_mdl_read_wait_miss: u64,
    /// Read-ahead I/O operations
    pub cc_read_ahead_ios: u64,
    /// Lazy-write I/O operations
    pub cc_lazy_write_ios: u64,
    /// Pages written by the lazy writer
    pub cc_lazy_write_pages: u64,
    /// Cache data flushes
    pub cc_data_flushes: u64,
    /// Cache data pages flushed
    pub cc_data_pages: u64,
    /// Context switches
    pub context_switches: u64,
    /// First-level translation buffer fills
    pub first_level_tb_fills: u64,
    /// System calls
    pub system_calls: u64,
    /// Total dirty cache pages, gated by [`SYSMEMINFO_PERF_CCTOTALDIRTYPAGES_VALID`]
    pub cc_total_dirty_pages: u64,
    /// Dirty page write threshold, gated by [`SYSMEMINFO_PERF_CCTOTALDIRTYPAGES_VALID`]
    pub cc_dirty_page_threshold: u64,
    /// Resident available pages, gated by [`SYSMEMINFO_PERF_RESIDENTAVAILABLE_VALID`]
    pub resident_available_pages: u64,
    /// Shared committed pages, gated by [`SYSMEMINFO_PERF_RESIDENTAVAILABLE_VALID`]
    pub shared_committed_pages: u64,
}

impl SystemPerfInfo {
    fn read(data: &[u8], offset: &mut usize) -> Result<SystemPerfInfo> {
        Ok(SystemPerfInfo {
            idle_process_time: read_le_at::<u64>(data, offset)?,
            io_read_transfer_count: read_le_at::<u64>(data, offset)?,
            io_write_transfer_count: read_le_at::<u64>(data, offset)?,
            io_other_transfer_count: read_le_at::<u64>(data, offset)?,
            io_read_operation_count: read_le_at::<u64>(data, offset)?,
            io_write_operation_count: read_le_at::<u64>(data, offset)?,
            io_other_operation_count: read_le_at::<u64>(data, offset)?,
            available_pages: read_le_at::<u64>(data, offset)?,
            committed_pages: read_le_at::<u64>(data, offset)?,
            commit_limit: read_le_at::<u64>(data, offset)?,
            peak_commitment: read_le_at::<u64>(data, offset)?,
            page_fault_count: read_le_at::<u64>(data, offset)?,
            copy_on_write_count: read_le_at::<u64>(data, offset)?,
            transition_count: read_le_at::<u64>(data, offset)?,
            cache_transition_count: read_le_at::<u64>(data, offset)?,
            demand_zero_count: read_le_at::<u64>(data, offset)?,
            page_read_count: read_le_at::<u64>(data, offset)?,
            page_read_io_count: read_le_at::<u64>(data, offset)?,
            cache_read_count: read_le_at::<u64>(data, offset)?,
            cache_io_count: read_le_at::<u64>(data, offset)?,
            dirty_pages_write_count: read_le_at::<u64>(data, offset)?,
            dirty_write_io_count: read_le_at::<u64>(data, offset)?,
            mapped_pages_write_count: read_le_at::<u64>(data, offset)?,
            mapped_write_io_count: read_le_at::<u64>(data, offset)?,
            paged_pool_pages: read_le_at::<u64>(data, offset)?,
            non_paged_pool_pages: read_le_at::<u64>(data, offset)?,
            paged_pool_allocs: read_le_at::<u64>(data, offset)?,
            paged_pool_frees: read_le_at::<u64>(data, offset)?,
            non_paged_pool_allocs: read_le_at::<u64>(data, offset)?,
            non_paged_pool_frees: read_le_at::<u64>(data, offset)?,
            free_system_ptes: read_le_at::<u64>(data, offset)?,
            resident_system_code_page: read_le_at::<u64>(data, offset)?,
            total_system_driver_pages: read_le_at::<u64>(data, offset)?,
            total_system_code_pages: read_le_at::<u64>(data, offset)?,
            non_paged_pool_lookaside_hits: read_le_at::<u64>(data, offset)?,
            paged_pool_lookaside_hits: read_le_at::<u64>(data, offset)?,
            available_paged_pool_pages: read_le_at::<u64>(data, offset)?,
            resident_system_cache_page: read_le_at::<u64>(data, offset)?,
            resident_paged_pool_page: read_le_at::<u64>(data, offset)?,
            resident_system_driver_page: read_le_at::<u64>(data, offset)?,
            cc_fast_read_no_wait: read_le_at::<u64>(data, offset)?,
            cc_fast_read_wait: read_le_at::<u64>(data, offset)?,
            cc_fast_read_resource_miss: read_le_at::<u64>(data, offset)?,
            cc_fast_read_not_possible: read_le_at::<u64>(data, offset)?,
            cc_fast_mdl_read_no_wait: read_le_at::<u64>(data, offset)?,
            cc_fast_mdl_read_wait: read_le_at::<u64>(data, offset)?,
            cc_fast_mdl_read_resource_miss: read_le_at::<u64>(data, offset)?,
            cc_fast_mdl_read_not_possible: read_le_at::<u64>(data, offset)?,
            cc_map_data_no_wait: read_le_at::<u64>(data, offset)?,
            cc_map_data_wait: read_le_at::<u64>(data, offset)?,
            cc_map_data_no_wait_miss: read_le_at::<u64>(data, offset)?,
            cc_map_data_wait_miss: read_le_at::<u64>(data, offset)?,
            cc_pin_mapped_data_count: read_le_at::<u64>(data, offset)?,
            cc_pin_read_no_wait: read_le_at::<u64>(data, offset)?,
            cc_pin_read_wait: read_le_at::<u64>(data, offset)?,
            cc_pin_read_no_wait_miss: read_le_at::<u64>(data, offset)?,
            cc_pin_read_wait_miss: read_le_at::<u64>(data, offset)?,
            cc_copy_read_no_wait: read_le_at::<u64>(data, offset)?,
            cc_copy_read_wait: read_le_at::<u64>(data, offset)?,
            cc_copy_read_no_wait_miss: read_le_at::<u64>(data, offset)?,
            cc_copy_read_wait_miss: read_le_at::<u64>(data, offset)?,
            cc_mdl_read_no_wait: read_le_at::<u64>(data, offset)?,
            cc_mdl_read_wait: read_le_at::<u64>(data, offset)?,
            cc_mdl_read_no_wait_miss: read_le_at::<u64>(data, offset)?,
            cc_mdl_read_wait_miss: read_le_at::<u64>(data, offset)?,
            cc_read_ahead_ios: read_le_at::<u64>(data, offset)?,
            cc_lazy_write_ios: read_le_at::<u64>(data, offset)?,
            cc_lazy_write_pages: read_le_at::<u64>(data, offset)?,
            cc_data_flushes: read_le_at::<u64>(data, offset)?,
            cc_data_pages: read_le_at::<u64>(data, offset)?,
            context_switches: read_le_at::<u64>(data, offset)?,
            first_level_tb_fills: read_le_at::<u64>(data, offset)?,
            system_calls: read_le_at::<u64>(data, offset)?,
            cc_total_dirty_pages: read_le_at::<u64>(data, offset)?,
            cc_dirty_page_threshold: read_le_at::<u64>(data, offset)?,
            resident_available_pages: read_le_at::<u64>(data, offset)?,
            shared_committed_pages: read_le_at::<u64>(data, offset)?,
        })
    }
}

/// The decoded system memory info stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemMemoryInfo {
    /// Record revision
    pub revision: u16,
    /// Validity bits for the gated fields (`SYSMEMINFO_*`)
    pub flags: u16,
    /// Basic machine parameters
    pub basic_info: SystemBasicInfo,
    /// File cache state
    pub file_cache_info: SystemFileCacheInfo,
    /// Commit summary
    pub basic_perf_info: SystemBasicPerfInfo,
    /// Full performance counter block
    pub perf_info: SystemPerfInfo,
}

/// Decodes the system memory info stream.
///
/// # Errors
/// Returns [`crate::Error::StreamDecode`] if the stream is shorter than the fixed
/// record.
pub(crate) fn decode(source: &dyn Backend, entry: &DirectoryEntry) -> Result<SystemMemoryInfo> {
    let data = stream_slice(source, entry)?;
    if data.len() < SYSTEM_MEMORY_INFO_SIZE {
        return Err(stream_error!(
            "System memory info stream of {} bytes is shorter than the {} byte record",
            data.len(),
            SYSTEM_MEMORY_INFO_SIZE
        ));
    }

    let mut offset = 0;
    let revision = read_le_at::<u16>(data, &mut offset)?;
    let flags = read_le_at::<u16>(data, &mut offset)?;
    let basic_info = SystemBasicInfo::read(data, &mut offset)?;
    let file_cache_info = SystemFileCacheInfo::read(data, &mut offset)?;
    let basic_perf_info = SystemBasicPerfInfo::read(data, &mut offset)?;
    let perf_info = SystemPerfInfo::read(data, &mut offset)?;

    Ok(SystemMemoryInfo {
        revision,
        flags,
        basic_info,
        file_cache_info,
        basic_perf_info,
        perf_info,
    })
}
