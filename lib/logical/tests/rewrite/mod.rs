mod filters;
mod joins;
mod paths;
mod pipeline;
mod property_functions;
mod test_utils;
