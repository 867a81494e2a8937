#![no_main]

use bgpio::packet::attribute::PathAttrs;
use bgpio::packet::message::DecodeCxt;
use bgpio_utils::arbitrary::BytesArbitrary;
use libfuzzer_sys::arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut u = Unstructured::new(data);

    if let Ok(BytesArbitrary(mut buf)) = BytesArbitrary::arbitrary(&mut u)
        && let Ok(cxt) = DecodeCxt::arbitrary(&mut u)
        && let Ok(nlri_present) = bool::arbitrary(&mut u)
    {
        let mut sink = Vec::new();
        if let Ok(attrs) = PathAttrs::decode(&mut buf, &cxt, &mut sink) {
            let _ = attrs.check_mandatory(nlri_present);
        }
    }
});
