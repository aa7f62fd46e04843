mod bgp;
mod cancellation;
mod functions;
mod joins;
mod modifiers;
mod paths;
mod test_utils;
