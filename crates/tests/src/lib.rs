#[cfg(test)]
mod common;

#[cfg(test)]
mod entity_tests;

#[cfg(test)]
mod document_tests;


#[cfg(test)]
mod health_tests;

#[cfg(test)]
mod client_tests;
