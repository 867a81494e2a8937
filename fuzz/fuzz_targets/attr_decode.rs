#![no_main]

use bgpio::debug::TracingSink;
use bgpio::packet::attribute::Attr;
use bgpio::packet::message::DecodeCxt;
use bgpio_utils::arbitrary::BytesArbitrary;
use libfuzzer_sys::arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);

    if let Ok(cxt) = DecodeCxt::arbitrary(&mut u)
        && let Ok(BytesArbitrary(mut buf)) =
            BytesArbitrary::arbitrary_take_rest(u)
    {
        let _ = Attr::decode(&mut buf, &cxt, &mut TracingSink);
    }
});
