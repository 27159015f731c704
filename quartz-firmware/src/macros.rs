/// Busy-waits for a literal number of core cycles.
#[macro_export]
macro_rules! delay_cycles {
    ($cycles:literal) => {
        seq_macro::seq!(N in 0..$cycles {
            cortex_m::asm::nop();
        });
    };
}
